use serde::{Deserialize, Serialize};

/// A bookmark offered by one user to another. Declining deletes the row,
/// so at most one share exists per `(bookmark_id, shared_with)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedBookmark {
    pub id: String,
    pub bookmark_id: String,
    pub shared_by: String,
    pub shared_with: String,
    pub workspace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub is_accepted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
