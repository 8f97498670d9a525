use serde::{Deserialize, Serialize};

/// User record owned by the external identity service. Read here only to
/// validate references (student exists, creator exists).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub branch_id: Option<String>,
}
