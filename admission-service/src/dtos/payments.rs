use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Installment, Payment, PaymentPlan, PaymentStatus};
use crate::services::razorpay::OrderNotes;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Admission is required"))]
    pub admission_id: String,
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
    pub payment_type: PaymentPlan,
    pub installment_no: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderData {
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
    pub key_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub data: CreateOrderData,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "Order id is required"))]
    pub razorpay_order_id: String,
    #[validate(length(min = 1, message = "Payment id is required"))]
    pub razorpay_payment_id: String,
    #[validate(length(min = 1, message = "Signature is required"))]
    pub razorpay_signature: String,
    #[validate(length(min = 1, message = "Admission is required"))]
    pub admission_id: String,
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
    pub payment_type: PaymentPlan,
    pub installment_no: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentData {
    pub payment_id: String,
    pub receipt_number: String,
    pub payment_status: PaymentStatus,
    pub paid_amount: f64,
    pub pending_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub data: VerifyPaymentData,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInstallmentsRequest {
    #[validate(length(min = 1, message = "Admission is required"))]
    pub admission_id: String,
    #[validate(range(min = 1, max = 12, message = "Installments must be between 1 and 12"))]
    pub number_of_installments: u32,
    #[validate(range(min = 0.01, message = "Installment amount must be positive"))]
    pub installment_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct InstallmentsResponse {
    pub success: bool,
    pub message: String,
    pub installments: Vec<InstallmentView>,
}

#[derive(Debug, Serialize)]
pub struct InstallmentListResponse {
    pub success: bool,
    pub installments: Vec<InstallmentView>,
}

#[derive(Debug, Serialize)]
pub struct PayInstallmentSummary {
    pub id: String,
    pub amount: f64,
    pub installment_no: u32,
    pub due_date: String,
}

#[derive(Debug, Serialize)]
pub struct PayInstallmentResponse {
    pub success: bool,
    pub order: CreateOrderData,
    pub key: String,
    pub installment: PayInstallmentSummary,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub success: bool,
    pub payments: Vec<PaymentView>,
}

/// JSON projection of a ledger entry (datetimes as RFC 3339 strings).
#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub id: String,
    pub admission_id: String,
    pub student_id: String,
    pub amount: f64,
    pub payment_date: String,
    pub payment_method: crate::models::PaymentMethod,
    pub payment_type: crate::models::PaymentKind,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub receipt_number: String,
    pub status: crate::models::PaymentRecordStatus,
    pub branch_id: Option<String>,
    pub installment_number: Option<u32>,
    pub verified: bool,
}

impl From<Payment> for PaymentView {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            admission_id: p.admission_id,
            student_id: p.student_id,
            amount: p.amount,
            payment_date: p.payment_date.to_rfc3339(),
            payment_method: p.payment_method,
            payment_type: p.payment_type,
            razorpay_order_id: p.razorpay_order_id,
            razorpay_payment_id: p.razorpay_payment_id,
            receipt_number: p.receipt_number,
            status: p.status,
            branch_id: p.branch_id,
            installment_number: p.installment_number,
            verified: p.verified,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InstallmentView {
    pub id: String,
    pub admission_id: String,
    pub installment_no: u32,
    pub amount: f64,
    pub due_date: String,
    pub status: crate::models::InstallmentStatus,
    pub paid_date: Option<String>,
    pub payment_id: Option<String>,
    pub late_fees: f64,
    pub total_amount: f64,
}

impl From<Installment> for InstallmentView {
    fn from(i: Installment) -> Self {
        Self {
            id: i.id,
            admission_id: i.admission_id,
            installment_no: i.installment_no,
            amount: i.amount,
            due_date: i.due_date.to_rfc3339(),
            status: i.status,
            paid_date: i
                .paid_date
                .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            payment_id: i.payment_id,
            late_fees: i.late_fees,
            total_amount: i.total_amount,
        }
    }
}
