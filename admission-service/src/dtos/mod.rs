mod admissions;
mod payments;
mod registry;

pub use admissions::*;
pub use payments::*;
pub use registry::*;
