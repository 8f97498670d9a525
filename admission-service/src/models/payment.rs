use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Cheque,
    Online,
    #[serde(rename = "UPI")]
    Upi,
    Card,
    Gateway,
}

/// What the payment settles: the full course fee, one EMI installment, or
/// the registration fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    OneTime,
    Emi,
    Registration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRecordStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// One ledger entry. Immutable after creation apart from the verification
/// fields; admission totals are derived from these records, never the other
/// way around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,
    pub admission_id: String,
    pub student_id: String,
    pub amount: f64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub payment_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentKind,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    /// Human-readable `PAY<year><sequence>` receipt, unique.
    pub receipt_number: String,
    pub status: PaymentRecordStatus,
    pub collected_by: Option<String>,
    pub branch_id: Option<String>,
    pub installment_number: Option<u32>,
    pub verified: bool,
    pub verified_at: Option<mongodb::bson::DateTime>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[allow(clippy::too_many_arguments)]
    pub fn verified_gateway_payment(
        admission_id: String,
        student_id: String,
        amount: f64,
        payment_type: PaymentKind,
        receipt_number: String,
        razorpay_order_id: String,
        razorpay_payment_id: String,
        razorpay_signature: String,
        branch_id: Option<String>,
        installment_number: Option<u32>,
        collected_by: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            admission_id,
            student_id,
            amount,
            payment_date: now,
            payment_method: PaymentMethod::Gateway,
            payment_type,
            razorpay_order_id: Some(razorpay_order_id),
            razorpay_payment_id: Some(razorpay_payment_id),
            razorpay_signature: Some(razorpay_signature),
            receipt_number,
            status: PaymentRecordStatus::Completed,
            collected_by,
            branch_id,
            installment_number,
            verified: true,
            verified_at: Some(mongodb::bson::DateTime::now()),
            created_at: now,
        }
    }
}
