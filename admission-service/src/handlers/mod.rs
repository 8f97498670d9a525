pub mod admissions;
pub mod branches;
pub mod courses;
pub mod health;
pub mod installments;
pub mod payments;

pub use health::{health_check, metrics_endpoint, readiness_check};
