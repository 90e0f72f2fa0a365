use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::bookmark::{Bookmark, BookmarkFolder, BookmarkType};
use crate::types::collection::Collection;
use crate::types::tag::Tag;

/// Aggregate counts for one user, optionally narrowed to one workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkStats {
    pub total_bookmarks: i64,
    pub total_folders: i64,
    pub total_tags: i64,
    pub total_collections: i64,
    pub count_by_type: BTreeMap<BookmarkType, i64>,
    pub recent_count: i64,
    pub favorites_count: i64,
}

/// Result ordering for search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
    Position,
}

impl SortOrder {
    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            SortOrder::Newest => "created_at DESC, rowid DESC",
            SortOrder::Oldest => "created_at ASC, rowid ASC",
            SortOrder::Title => "title ASC, rowid ASC",
            SortOrder::Position => "position ASC, rowid ASC",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Case-insensitive substring over title or description.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, rename = "type")]
    pub bookmark_type: Option<BookmarkType>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<Bookmark>,
}

/// Full, unpaginated snapshot of a user's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub bookmarks: Vec<Bookmark>,
    pub folders: Vec<BookmarkFolder>,
    pub tags: Vec<Tag>,
    pub collections: Vec<Collection>,
    pub exported_at: DateTime<Utc>,
}

/// One entry of an import request. `bookmark_type` is validated per item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportItem {
    #[serde(rename = "type")]
    pub bookmark_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}
