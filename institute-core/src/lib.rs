pub mod auth;
pub mod error;
pub mod observability;
pub mod scope;
