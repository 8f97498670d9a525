use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Branch, Course, CourseCategory};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, message = "Branch name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Branch code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "Contact is required"))]
    pub contact: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateBranchRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, message = "Course title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Course code is required"))]
    pub code: String,
    pub category: CourseCategory,
    #[validate(range(min = 1, message = "Duration must be at least one month"))]
    pub duration_months: u32,
    #[validate(range(min = 0.0, message = "Fees cannot be negative"))]
    pub fees: f64,
    #[serde(default)]
    pub branch_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub category: Option<CourseCategory>,
    pub duration_months: Option<u32>,
    pub fees: Option<f64>,
    pub branch_ids: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CourseListParams {
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BranchView {
    pub id: String,
    pub name: String,
    pub code: String,
    pub address: String,
    pub contact: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Branch> for BranchView {
    fn from(b: Branch) -> Self {
        Self {
            id: b.id,
            name: b.name,
            code: b.code,
            address: b.address,
            contact: b.contact,
            is_active: b.is_active,
            created_at: b.created_at.to_rfc3339(),
            updated_at: b.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseView {
    pub id: String,
    pub title: String,
    pub code: String,
    pub category: CourseCategory,
    pub duration_months: u32,
    pub fees: f64,
    pub branch_ids: Vec<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Course> for CourseView {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            title: c.title,
            code: c.code,
            category: c.category,
            duration_months: c.duration_months,
            fees: c.fees,
            branch_ids: c.branch_ids,
            is_active: c.is_active,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BranchResponse {
    pub message: String,
    pub branch: BranchView,
}

#[derive(Debug, Serialize)]
pub struct BranchListResponse {
    pub branches: Vec<BranchView>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub message: String,
    pub course: CourseView,
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseView>,
}
