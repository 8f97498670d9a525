//! Branch registry endpoints. Writes are admin-only; branches are
//! soft-deleted so historical admissions keep resolving.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use institute_core::auth::Role;
use institute_core::error::AppError;
use validator::Validate;

use crate::dtos::{
    BranchListResponse, BranchResponse, BranchView, CreateBranchRequest, UpdateBranchRequest,
};
use crate::middleware::AuthUser;
use crate::models::Branch;
use crate::startup::AppState;
use crate::utils::patch_document;

pub async fn create_branch(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateBranchRequest>,
) -> Result<(StatusCode, Json<BranchResponse>), AppError> {
    user.scope().require_role(&[Role::Admin])?;
    request.validate()?;

    let branch = Branch::new(request.name, request.code, request.address, request.contact);
    state.registry.create_branch(&branch).await.map_err(|e| {
        // The unique code index surfaces duplicates as a write error.
        if e.to_string().contains("E11000") {
            AppError::Conflict(anyhow::anyhow!("Branch code already exists"))
        } else {
            AppError::InternalError(e)
        }
    })?;

    tracing::info!(branch_id = %branch.id, code = %branch.code, "Branch created");
    Ok((
        StatusCode::CREATED,
        Json(BranchResponse {
            message: "Branch created successfully".to_string(),
            branch: branch.into(),
        }),
    ))
}

pub async fn list_branches(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<BranchListResponse>, AppError> {
    let branches = state.registry.list_branches().await?;
    Ok(Json(BranchListResponse {
        branches: branches.into_iter().map(BranchView::from).collect(),
    }))
}

pub async fn get_branch(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BranchView>, AppError> {
    let branch = state
        .registry
        .find_branch(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Branch not found")))?;
    Ok(Json(branch.into()))
}

pub async fn update_branch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateBranchRequest>,
) -> Result<Json<BranchResponse>, AppError> {
    user.scope().require_role(&[Role::Admin])?;

    let mut set = patch_document(None, &request)?;
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Nothing to update")));
    }
    set.insert("updated_at", mongodb::bson::DateTime::now());

    let branch = state
        .registry
        .update_branch(&id, set)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Branch not found")))?;

    Ok(Json(BranchResponse {
        message: "Branch updated successfully".to_string(),
        branch: branch.into(),
    }))
}

pub async fn delete_branch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.scope().require_role(&[Role::Admin])?;

    if !state.registry.deactivate_branch(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Branch not found")));
    }

    tracing::info!(branch_id = %id, "Branch deactivated");
    Ok(Json(
        serde_json::json!({ "message": "Branch deactivated successfully" }),
    ))
}
