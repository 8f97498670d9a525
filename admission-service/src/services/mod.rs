pub mod metrics;
pub mod razorpay;
pub mod registry;
pub mod repository;
pub mod storage;

pub use metrics::{get_metrics, init_metrics};
pub use razorpay::{OrderNotes, PaymentVerification, RazorpayClient};
pub use registry::RegistryRepository;
pub use repository::{AdmissionFilters, AdmissionRepository};
pub use storage::{LocalStorage, PhotoStorage};
