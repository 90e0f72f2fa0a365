use serde::{Deserialize, Serialize};

/// Written when a version is restored onto its bookmark.
pub const ACTION_RESTORED: &str = "restored";
/// Written for every bookmark created by an import.
pub const ACTION_IMPORTED: &str = "imported";

/// One entry of a bookmark's activity log. `action` is caller-defined text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkActivity {
    pub id: String,
    pub bookmark_id: String,
    pub user_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: i64,
}
