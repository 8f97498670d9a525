use serde::{Deserialize, Serialize};

/// Per-year receipt sequence, keyed `<entity>:<year>` (e.g. `admission:2026`).
/// Advanced with an atomic `$inc` so concurrent creations never collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceCounter {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: i64,
}
