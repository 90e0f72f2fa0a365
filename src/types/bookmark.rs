use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a bookmark points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkType {
    Message,
    Channel,
    File,
    Thread,
    External,
}

impl BookmarkType {
    /// All variants, in declaration order.
    pub const ALL: [BookmarkType; 5] = [
        BookmarkType::Message,
        BookmarkType::Channel,
        BookmarkType::File,
        BookmarkType::Thread,
        BookmarkType::External,
    ];

    /// The lowercase name stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkType::Message => "message",
            BookmarkType::Channel => "channel",
            BookmarkType::File => "file",
            BookmarkType::Thread => "thread",
            BookmarkType::External => "external",
        }
    }
}

impl fmt::Display for BookmarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookmarkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookmarkType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown bookmark type '{}'", s))
    }
}

/// A saved reference to a message, channel, file, thread or external URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub folder_id: Option<String>,
    #[serde(rename = "type")]
    pub bookmark_type: BookmarkType,
    pub title: String,
    pub description: String,
    pub target_id: String,
    pub target_url: Option<String>,
    /// Caller-owned serialized metadata; never interpreted here.
    pub metadata: Option<String>,
    pub position: i32,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl Bookmark {
    /// True unless the bookmark has been tombstoned.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Input for creating a bookmark through the bookmark store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
    pub user_id: String,
    pub workspace_id: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(rename = "type")]
    pub bookmark_type: BookmarkType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_id: String,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Represents a folder for organizing bookmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkFolder {
    pub id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub position: i32,
    pub created_at: i64,
}
