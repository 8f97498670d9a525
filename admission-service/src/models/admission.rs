//! Admission aggregate: one student enrolled into one course at one branch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionStatus {
    Active,
    Inactive,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Full payment up front, or an EMI plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPlan {
    OneTime,
    Emi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Derive status from the ledger totals.
    ///
    /// PAID iff nothing is pending, PARTIAL once any amount has landed,
    /// PENDING otherwise.
    pub fn derive(total_fees: f64, paid_amount: f64) -> (f64, PaymentStatus) {
        let pending = (total_fees - paid_amount).max(0.0);
        let status = if paid_amount > 0.0 && pending <= 0.0 {
            PaymentStatus::Paid
        } else if paid_amount > 0.0 {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        };
        (pending, status)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub district: String,
    pub pincode: String,
    pub state: String,
}

/// Course linkage. Duration and fees are copied from the Course record at
/// admission time; the course catalog stays authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetails {
    pub course_id: String,
    pub batch_id: Option<String>,
    pub branch_id: String,
    pub course_duration_months: u32,
    pub course_fees: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_type: PaymentPlan,
    pub total_fees: f64,
    pub paid_amount: f64,
    pub pending_amount: f64,
    pub payment_status: PaymentStatus,
    pub registration_fees: f64,
    pub transaction_id: Option<String>,
    pub razorpay_order_id: Option<String>,
    pub number_of_installments: Option<u32>,
    pub installment_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admission {
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-readable `ADM-<year>-<sequence>` receipt, unique.
    pub receipt_number: String,
    pub status: AdmissionStatus,
    pub student_id: String,
    pub created_by: String,
    pub personal_details: PersonalDetails,
    pub address: Address,
    pub course_details: CourseDetails,
    pub payment_details: PaymentDetails,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Admission {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        receipt_number: String,
        student_id: String,
        created_by: String,
        personal_details: PersonalDetails,
        address: Address,
        course_details: CourseDetails,
        payment_details: PaymentDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            receipt_number,
            status: AdmissionStatus::Active,
            student_id,
            created_by,
            personal_details,
            address,
            course_details,
            payment_details,
            created_at: now,
            updated_at: now,
        }
    }
}

impl PaymentDetails {
    /// Fresh ledger: nothing paid, everything pending.
    pub fn initial(
        payment_type: PaymentPlan,
        total_fees: f64,
        registration_fees: f64,
        number_of_installments: Option<u32>,
        installment_amount: Option<f64>,
    ) -> Self {
        Self {
            payment_type,
            total_fees,
            paid_amount: 0.0,
            pending_amount: total_fees,
            payment_status: PaymentStatus::Pending,
            registration_fees,
            transaction_id: None,
            razorpay_order_id: None,
            number_of_installments,
            installment_amount,
        }
    }
}
