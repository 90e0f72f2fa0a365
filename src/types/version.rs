use serde::{Deserialize, Serialize};

/// Change note recorded by `restore` for the pre-restore snapshot.
pub const BEFORE_RESTORE_NOTE: &str = "Before restore";

/// Immutable snapshot of a bookmark's editable fields.
///
/// `version` runs 1..=N per bookmark with no gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkVersion {
    pub id: String,
    pub bookmark_id: String,
    /// Who triggered the snapshot.
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub target_url: Option<String>,
    pub metadata: Option<String>,
    pub version: i64,
    pub change_note: Option<String>,
    pub created_at: i64,
}
