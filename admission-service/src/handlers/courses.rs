//! Course catalog endpoints.
//!
//! Admins manage the whole catalog; branch admins manage courses offered at
//! their own branch and are implicitly pinned to it on create.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use institute_core::auth::Role;
use institute_core::error::AppError;
use institute_core::scope::AccessScope;
use validator::Validate;

use crate::dtos::{
    CourseListParams, CourseListResponse, CourseResponse, CourseView, CreateCourseRequest,
    UpdateCourseRequest,
};
use crate::middleware::AuthUser;
use crate::models::Course;
use crate::startup::AppState;
use crate::utils::patch_document;

const CATALOG_ROLES: [Role; 2] = [Role::Admin, Role::BranchAdmin];

/// Load a course a branch admin is allowed to manage; out-of-branch courses
/// read as missing.
async fn managed_course(
    state: &AppState,
    scope: &AccessScope,
    id: &str,
) -> Result<Course, AppError> {
    let course = state
        .registry
        .find_course(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Course not found")))?;

    if scope.role == Role::BranchAdmin {
        let in_branch = scope
            .branch_id
            .as_ref()
            .map(|branch| course.branch_ids.contains(branch))
            .unwrap_or(false);
        if !in_branch {
            return Err(AppError::NotFound(anyhow::anyhow!("Course not found")));
        }
    }
    Ok(course)
}

pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let scope = user.scope();
    scope.require_role(&CATALOG_ROLES)?;
    request.validate()?;

    let branch_ids = match (scope.role, &scope.branch_id) {
        (Role::BranchAdmin, Some(branch)) => vec![branch.clone()],
        _ => request.branch_ids,
    };

    let course = Course::new(
        request.title,
        request.code,
        request.category,
        request.duration_months,
        request.fees,
        branch_ids,
    );
    state.registry.create_course(&course).await.map_err(|e| {
        if e.to_string().contains("E11000") {
            AppError::Conflict(anyhow::anyhow!("Course code already exists"))
        } else {
            AppError::InternalError(e)
        }
    })?;

    tracing::info!(course_id = %course.id, code = %course.code, "Course created");
    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            message: "Course created successfully".to_string(),
            course: course.into(),
        }),
    ))
}

pub async fn list_courses(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<CourseListParams>,
) -> Result<Json<CourseListResponse>, AppError> {
    let scope = user.scope();

    // Branch admins always see their own branch's catalog slice.
    let branch_filter = match (scope.role, &scope.branch_id) {
        (Role::BranchAdmin, Some(branch)) => Some(branch.clone()),
        _ => params.branch_id,
    };

    let courses = state.registry.list_courses(branch_filter.as_deref()).await?;
    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(CourseView::from).collect(),
    }))
}

pub async fn get_course(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CourseView>, AppError> {
    let course = state
        .registry
        .find_course(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Course not found")))?;
    Ok(Json(course.into()))
}

pub async fn update_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, AppError> {
    let scope = user.scope();
    scope.require_role(&CATALOG_ROLES)?;
    managed_course(&state, &scope, &id).await?;

    let mut set = patch_document(None, &request)?;
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Nothing to update")));
    }
    set.insert("updated_at", mongodb::bson::DateTime::now());

    let course = state
        .registry
        .update_course(&id, set)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Course not found")))?;

    Ok(Json(CourseResponse {
        message: "Course updated successfully".to_string(),
        course: course.into(),
    }))
}

pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let scope = user.scope();
    scope.require_role(&CATALOG_ROLES)?;
    managed_course(&state, &scope, &id).await?;

    if !state.registry.deactivate_course(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Course not found")));
    }

    tracing::info!(course_id = %id, "Course deactivated");
    Ok(Json(
        serde_json::json!({ "message": "Course deactivated successfully" }),
    ))
}
