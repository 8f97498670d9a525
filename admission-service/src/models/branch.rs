use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical institute location; the unit of data isolation for non-admin
/// roles. Soft-deleted via `is_active`, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub code: String,
    pub address: String,
    pub contact: String,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Branch {
    pub fn new(name: String, code: String, address: String, contact: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            code,
            address,
            contact,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
