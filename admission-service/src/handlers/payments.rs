//! Gateway payment endpoints.
//!
//! `create_order` opens a hosted checkout order; `verify_payment` is the only
//! path that records money. Verification checks the gateway signature first
//! and writes nothing when it fails, then appends a ledger entry and
//! recomputes the admission totals from the ledger.

use axum::{
    extract::{Path, State},
    Json,
};
use institute_core::auth::Role;
use institute_core::error::AppError;
use institute_core::scope::AccessScope;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    CreateOrderData, CreateOrderRequest, CreateOrderResponse, PaymentListResponse, PaymentView,
    VerifyPaymentData, VerifyPaymentRequest, VerifyPaymentResponse,
};
use crate::middleware::AuthUser;
use crate::models::{Admission, Payment, PaymentKind, PaymentPlan};
use crate::services::razorpay::{OrderNotes, PaymentVerification};
use crate::services::repository::PaymentStats;
use crate::startup::AppState;

/// Resolve the admission a payment call targets.
///
/// Students get 403 on someone else's admission (they know it is not theirs);
/// branch admins get 404 outside their branch (existence must not leak).
pub(crate) async fn admission_for_payment(
    state: &AppState,
    scope: &AccessScope,
    admission_id: &str,
) -> Result<Admission, AppError> {
    let admission = state
        .repository
        .find_admission_unscoped(admission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Admission not found")))?;

    match scope.role {
        Role::Student if admission.student_id != scope.user_id => Err(AppError::Forbidden {
            required: "STUDENT (own admission)".to_string(),
            current: scope.role.to_string(),
        }),
        Role::BranchAdmin
            if scope.branch_id.as_deref() != Some(admission.course_details.branch_id.as_str()) =>
        {
            Err(AppError::NotFound(anyhow::anyhow!("Admission not found")))
        }
        _ => Ok(admission),
    }
}

fn amount_to_paise(amount: f64) -> u64 {
    (amount * 100.0).round() as u64
}

fn checkout_receipt() -> String {
    // Razorpay caps receipts at 40 chars.
    format!("rcpt_{}", Uuid::new_v4().simple())
}

pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    request.validate()?;
    let scope = user.scope();

    let admission = admission_for_payment(&state, &scope, &request.admission_id).await?;

    let installment = match request.payment_type {
        PaymentPlan::Emi => {
            let no = request.installment_no.ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Installment number is required for EMI"))
            })?;
            if let Some(total) = admission.payment_details.number_of_installments {
                if no < 1 || no > total {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "Installment number out of range (1-{})",
                        total
                    )));
                }
            }
            let row = state
                .repository
                .find_installment_by_no(&admission.id, no)
                .await?;
            // Without a configured count the schedule rows are the only
            // bound; an EMI order must target one of them.
            if admission.payment_details.number_of_installments.is_none() && row.is_none() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "No installment plan configured for this admission"
                )));
            }
            row
        }
        PaymentPlan::OneTime => None,
    };

    let notes = OrderNotes {
        admission_id: admission.id.clone(),
        payment_type: match request.payment_type {
            PaymentPlan::OneTime => "ONE_TIME".to_string(),
            PaymentPlan::Emi => "EMI".to_string(),
        },
        student_id: admission.student_id.clone(),
        installment_no: request.installment_no,
        installment_id: installment.map(|i| i.id),
    };

    let receipt = checkout_receipt();
    let order = state
        .razorpay
        .create_order(amount_to_paise(request.amount), "INR", receipt, notes.clone())
        .await
        .map_err(AppError::InternalError)?;

    Ok(Json(CreateOrderResponse {
        success: true,
        data: CreateOrderData {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or_default(),
            notes,
            key_id: state.razorpay.key_id().to_string(),
        },
    }))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    request.validate()?;
    let scope = user.scope();

    let admission = admission_for_payment(&state, &scope, &request.admission_id).await?;

    let verification = PaymentVerification {
        razorpay_order_id: request.razorpay_order_id.clone(),
        razorpay_payment_id: request.razorpay_payment_id.clone(),
        razorpay_signature: request.razorpay_signature.clone(),
    };
    let valid = state
        .razorpay
        .verify_payment_signature(&verification)
        .map_err(AppError::InternalError)?;
    if !valid {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid payment signature"
        )));
    }

    let payment_kind = match request.payment_type {
        PaymentPlan::OneTime => PaymentKind::OneTime,
        PaymentPlan::Emi => PaymentKind::Emi,
    };

    let receipt_number = state.repository.next_payment_receipt().await?;
    let payment = Payment::verified_gateway_payment(
        admission.id.clone(),
        admission.student_id.clone(),
        request.amount,
        payment_kind,
        receipt_number.clone(),
        request.razorpay_order_id,
        request.razorpay_payment_id,
        request.razorpay_signature,
        Some(admission.course_details.branch_id.clone()),
        request.installment_no,
        Some(user.0.sub.clone()),
    );
    state.repository.create_payment(&payment).await?;

    let (paid_amount, pending_amount, payment_status) = state
        .repository
        .reconcile_admission_ledger(&admission.id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Admission not found")))?;

    if payment_kind == PaymentKind::Emi {
        if let Some(no) = request.installment_no {
            if let Some(installment) = state
                .repository
                .find_installment_by_no(&admission.id, no)
                .await?
            {
                state
                    .repository
                    .mark_installment_paid(&installment.id, &payment.id)
                    .await?;
            }
        }
    }

    crate::services::metrics::record_payment("GATEWAY", amount_to_paise(request.amount));
    tracing::info!(
        payment_id = %payment.id,
        admission_id = %admission.id,
        receipt_number = %receipt_number,
        amount = request.amount,
        "Payment verified and recorded"
    );

    Ok(Json(VerifyPaymentResponse {
        success: true,
        data: VerifyPaymentData {
            payment_id: payment.id,
            receipt_number,
            payment_status,
            paid_amount,
            pending_amount,
        },
    }))
}

pub async fn admission_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(admission_id): Path<String>,
) -> Result<Json<PaymentListResponse>, AppError> {
    let scope = user.scope();

    state
        .repository
        .find_admission(&scope, &admission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Admission not found")))?;

    let payments = state
        .repository
        .payments_for_admission(&scope, &admission_id)
        .await?;

    Ok(Json(PaymentListResponse {
        success: true,
        payments: payments.into_iter().map(PaymentView::from).collect(),
    }))
}

#[derive(Debug, serde::Serialize)]
pub struct PaymentStatsResponse {
    pub success: bool,
    pub stats: PaymentStats,
}

pub async fn payment_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PaymentStatsResponse>, AppError> {
    let scope = user.scope();
    scope.require_role(&[Role::Admin, Role::BranchAdmin, Role::Staff])?;

    let stats = state.repository.payment_stats(&scope).await?;
    Ok(Json(PaymentStatsResponse {
        success: true,
        stats,
    }))
}
