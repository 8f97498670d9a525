use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseCategory {
    Programming,
    Design,
    Language,
    Academic,
    Competitive,
    Other,
}

/// Catalog entry. Fees and duration here are authoritative for every
/// admission created against the course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub code: String,
    pub category: CourseCategory,
    pub duration_months: u32,
    pub fees: f64,
    pub branch_ids: Vec<String>,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn new(
        title: String,
        code: String,
        category: CourseCategory,
        duration_months: u32,
        fees: f64,
        branch_ids: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            code,
            category,
            duration_months,
            fees,
            branch_ids,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
