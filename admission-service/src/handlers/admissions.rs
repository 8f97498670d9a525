//! Admission lifecycle endpoints.
//!
//! Creation arrives as multipart: one `data` field carrying the full JSON
//! document, plus an optional `photo` file. Course duration and fees are
//! copied from the catalog, never trusted from the request.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use institute_core::auth::Role;
use institute_core::error::AppError;
use mongodb::bson::Document;
use serde::Serialize;
use validator::Validate;

use crate::dtos::{
    AdmissionListParams, AdmissionListResponse, AdmissionResponse, AdmissionView,
    CreateAdmissionRequest, Pagination, UpdateAdmissionRequest,
};
use crate::middleware::AuthUser;
use crate::models::{Address, Admission, CourseDetails, PaymentDetails, PersonalDetails};
use crate::services::repository::{AdmissionFilters, AdmissionStats, CourseStat};
use crate::services::storage::photo_storage_key;
use crate::startup::AppState;
use crate::utils::patch_document;

const STAFF_ROLES: [Role; 3] = [Role::Admin, Role::BranchAdmin, Role::Staff];

/// Expand registry references (student, creator, course, branch) into display
/// names for single-record responses.
async fn expand_view(state: &AppState, admission: Admission) -> Result<AdmissionView, AppError> {
    let student = state.registry.find_user(&admission.student_id).await?;
    let creator = state.registry.find_user(&admission.created_by).await?;
    let course = state
        .registry
        .find_course(&admission.course_details.course_id)
        .await?;
    let branch = state
        .registry
        .find_branch(&admission.course_details.branch_id)
        .await?;

    let mut view = AdmissionView::from(admission);
    view.student_name = student.map(|u| u.name);
    view.created_by_name = creator.map(|u| u.name);
    view.course_title = course.map(|c| c.title);
    view.branch_name = branch.map(|b| b.name);
    Ok(view)
}

pub async fn create_admission(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AdmissionResponse>), AppError> {
    let scope = user.scope();
    scope.require_role(&STAFF_ROLES)?;

    let mut request: Option<CreateAdmissionRequest> = None;
    let mut photo: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("data") => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Unreadable data field: {}", e))
                })?;
                request = Some(serde_json::from_str(&text).map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Invalid admission data: {}", e))
                })?);
            }
            Some("photo") => {
                let filename = field.file_name().unwrap_or("photo").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Unreadable photo field: {}", e))
                })?;
                photo = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let request =
        request.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing data field")))?;
    request.validate()?;

    state
        .registry
        .find_user(&request.student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found")))?;

    let course = state
        .registry
        .find_active_course(&request.course_details.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Course not found")))?;

    // Branch admins enroll into their own branch regardless of the id in the
    // payload.
    let branch_id = match (scope.role, &scope.branch_id) {
        (Role::BranchAdmin, Some(own_branch)) => own_branch.clone(),
        _ => request.course_details.branch_id.clone(),
    };
    state
        .registry
        .find_active_branch(&branch_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Branch not found")))?;

    let photo_url = match photo {
        Some((filename, bytes)) => {
            let key = photo_storage_key(&filename, bytes.len())?;
            state.storage.save(&key, bytes).await?;
            Some(format!("/uploads/{}", key))
        }
        None => None,
    };

    let payment = &request.payment_details;
    let personal = request.personal_details;
    let address = request.address;

    let receipt_number = state.repository.next_admission_receipt().await?;
    let admission = Admission::new(
        receipt_number,
        request.student_id,
        user.0.sub.clone(),
        PersonalDetails {
            name: personal.name,
            mobile: personal.mobile,
            email: personal.email,
            date_of_birth: personal.date_of_birth,
            gender: personal.gender,
            photo_url,
        },
        Address {
            line1: address.line1,
            line2: address.line2,
            landmark: address.landmark,
            city: address.city,
            district: address.district,
            pincode: address.pincode,
            state: address.state,
        },
        CourseDetails {
            course_id: course.id.clone(),
            batch_id: request.course_details.batch_id,
            branch_id,
            course_duration_months: course.duration_months,
            course_fees: course.fees,
        },
        PaymentDetails::initial(
            payment.payment_type,
            course.fees,
            payment.registration_fees,
            payment.number_of_installments,
            payment.installment_amount,
        ),
    );

    state.repository.create_admission(&admission).await?;
    crate::services::metrics::record_admission(&admission.course_details.branch_id);

    tracing::info!(
        admission_id = %admission.id,
        receipt_number = %admission.receipt_number,
        course_id = %course.id,
        "Admission created"
    );

    Ok((
        StatusCode::CREATED,
        Json(AdmissionResponse {
            message: "Admission created successfully".to_string(),
            admission: expand_view(&state, admission).await?,
        }),
    ))
}

pub async fn list_admissions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<AdmissionListParams>,
) -> Result<Json<AdmissionListResponse>, AppError> {
    let scope = user.scope();

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let filters = AdmissionFilters {
        branch_id: params.branch_id,
        course_id: params.course_id,
        status: params.status,
    };

    let (admissions, total) = state
        .repository
        .list_admissions(&scope, &filters, page, limit)
        .await?;

    let pages = total.div_ceil(limit as u64);
    Ok(Json(AdmissionListResponse {
        admissions: admissions.into_iter().map(AdmissionView::from).collect(),
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    }))
}

pub async fn get_admission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AdmissionView>, AppError> {
    let admission = state
        .repository
        .find_admission(&user.scope(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Admission not found")))?;
    Ok(Json(expand_view(&state, admission).await?))
}

pub async fn update_admission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateAdmissionRequest>,
) -> Result<Json<AdmissionResponse>, AppError> {
    let scope = user.scope();
    scope.require_role(&STAFF_ROLES)?;

    let mut set = Document::new();
    if let Some(status) = request.status {
        let status = mongodb::bson::to_bson(&status)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Invalid status value: {}", e)))?;
        set.insert("status", status);
    }
    if let Some(ref patch) = request.personal_details {
        set.extend(patch_document(Some("personal_details"), patch)?);
    }
    if let Some(ref patch) = request.address {
        set.extend(patch_document(Some("address"), patch)?);
    }
    if let Some(ref patch) = request.course_details {
        set.extend(patch_document(Some("course_details"), patch)?);
    }
    if let Some(ref patch) = request.payment_details {
        set.extend(patch_document(Some("payment_details"), patch)?);
    }
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Nothing to update")));
    }
    set.insert("updated_at", mongodb::bson::DateTime::now());

    let admission = state
        .repository
        .update_admission(&scope, &id, set)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Admission not found")))?;

    Ok(Json(AdmissionResponse {
        message: "Admission updated successfully".to_string(),
        admission: expand_view(&state, admission).await?,
    }))
}

pub async fn delete_admission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let scope = user.scope();
    scope.require_role(&[Role::Admin, Role::BranchAdmin])?;

    let admission = state
        .repository
        .find_admission(&scope, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Admission not found")))?;

    if !state.repository.delete_admission(&scope, &id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Admission not found")));
    }

    // Best effort: an orphaned photo file is not worth failing the delete.
    if let Some(url) = admission.personal_details.photo_url {
        if let Some(key) = url.strip_prefix("/uploads/") {
            if let Err(err) = state.storage.delete(key).await {
                tracing::warn!(admission_id = %id, error = %err, "Failed to delete admission photo");
            }
        }
    }

    tracing::info!(admission_id = %id, "Admission deleted");
    Ok(Json(
        serde_json::json!({ "message": "Admission deleted successfully" }),
    ))
}

#[derive(Debug, Serialize)]
pub struct AdmissionStatsResponse {
    pub stats: AdmissionStats,
    pub course_stats: Vec<CourseStat>,
}

pub async fn admission_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AdmissionStatsResponse>, AppError> {
    let scope = user.scope();
    scope.require_role(&STAFF_ROLES)?;

    let stats = state.repository.admission_stats(&scope).await?;
    let course_stats = state.repository.course_stats(&scope).await?;

    Ok(Json(AdmissionStatsResponse {
        stats,
        course_stats,
    }))
}
