use serde::{Deserialize, Serialize};

/// Identifier handed out for a submitted flight plan.
pub type FpId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// The authenticated person behind a request.
///
/// Produced by the API's auth layer and trusted as-is by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: String,
    pub role: String,
}
