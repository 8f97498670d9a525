//! EMI schedule endpoints.
//!
//! The schedule is regenerated wholesale: creating installments for an
//! admission drops any previous rows and inserts a fresh UNPAID set, so the
//! operation is idempotent. Paying an installment opens a checkout order;
//! the money is only recorded by the payment verify flow.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use institute_core::auth::Role;
use institute_core::error::AppError;
use mongodb::bson::doc;
use validator::Validate;

use crate::dtos::{
    CreateInstallmentsRequest, CreateOrderData, InstallmentListResponse, InstallmentView,
    InstallmentsResponse, PayInstallmentResponse, PayInstallmentSummary,
};
use crate::handlers::payments::admission_for_payment;
use crate::middleware::AuthUser;
use crate::models::InstallmentStatus;
use crate::services::razorpay::OrderNotes;
use crate::startup::AppState;

pub async fn create_installments(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateInstallmentsRequest>,
) -> Result<(StatusCode, Json<InstallmentsResponse>), AppError> {
    request.validate()?;
    let scope = user.scope();
    scope.require_role(&[Role::Admin, Role::BranchAdmin, Role::Staff])?;

    state
        .repository
        .find_admission(&scope, &request.admission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Admission not found")))?;

    let installments = state
        .repository
        .replace_installments(
            &request.admission_id,
            request.number_of_installments,
            request.installment_amount,
            Utc::now(),
        )
        .await?;

    state
        .repository
        .update_admission(
            &scope,
            &request.admission_id,
            doc! {
                "payment_details.number_of_installments": request.number_of_installments,
                "payment_details.installment_amount": request.installment_amount,
                "updated_at": mongodb::bson::DateTime::now(),
            },
        )
        .await?;

    tracing::info!(
        admission_id = %request.admission_id,
        count = request.number_of_installments,
        "Installment schedule created"
    );

    Ok((
        StatusCode::CREATED,
        Json(InstallmentsResponse {
            success: true,
            message: "Installments created successfully".to_string(),
            installments: installments.into_iter().map(InstallmentView::from).collect(),
        }),
    ))
}

pub async fn admission_installments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(admission_id): Path<String>,
) -> Result<Json<InstallmentListResponse>, AppError> {
    let scope = user.scope();

    state
        .repository
        .find_admission(&scope, &admission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Admission not found")))?;

    let installments = state
        .repository
        .installments_for_admission(&admission_id)
        .await?;

    Ok(Json(InstallmentListResponse {
        success: true,
        installments: installments.into_iter().map(InstallmentView::from).collect(),
    }))
}

pub async fn pay_installment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(installment_id): Path<String>,
) -> Result<Json<PayInstallmentResponse>, AppError> {
    let scope = user.scope();

    let installment = state
        .repository
        .find_installment(&installment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Installment not found")))?;

    let admission = admission_for_payment(&state, &scope, &installment.admission_id).await?;

    if installment.status == InstallmentStatus::Paid {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Installment already paid"
        )));
    }

    let notes = OrderNotes {
        admission_id: admission.id.clone(),
        payment_type: "EMI".to_string(),
        student_id: admission.student_id.clone(),
        installment_no: Some(installment.installment_no),
        installment_id: Some(installment.id.clone()),
    };

    // Late fees, if any, are baked into total_amount.
    let amount_paise = (installment.total_amount * 100.0).round() as u64;
    let receipt = format!("rcpt_{}", uuid::Uuid::new_v4().simple());
    let order = state
        .razorpay
        .create_order(amount_paise, "INR", receipt, notes.clone())
        .await
        .map_err(AppError::InternalError)?;

    Ok(Json(PayInstallmentResponse {
        success: true,
        order: CreateOrderData {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or_default(),
            notes,
            key_id: state.razorpay.key_id().to_string(),
        },
        key: state.razorpay.key_id().to_string(),
        installment: PayInstallmentSummary {
            id: installment.id,
            amount: installment.total_amount,
            installment_no: installment.installment_no,
            due_date: installment.due_date.to_rfc3339(),
        },
    }))
}
