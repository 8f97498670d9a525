mod admission;
mod branch;
mod counter;
mod course;
mod installment;
mod payment;
mod user;

pub use admission::{
    Address, Admission, AdmissionStatus, CourseDetails, Gender, PaymentDetails, PaymentPlan,
    PaymentStatus, PersonalDetails,
};
pub use branch::Branch;
pub use counter::SequenceCounter;
pub use course::{Course, CourseCategory};
pub use installment::{Installment, InstallmentStatus};
pub use payment::{Payment, PaymentKind, PaymentMethod, PaymentRecordStatus};
pub use user::User;
