//! Column lists and row mappers shared by every store.
//!
//! Bookmark queries always alias the `bookmarks` table as `b` so the
//! [`LIVE_BOOKMARK`] predicate can be dropped into joins unchanged.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;

use crate::types::bookmark::{Bookmark, BookmarkFolder, BookmarkType};
use crate::types::collection::Collection;
use crate::types::schedule::ReminderStatus;
use crate::types::tag::Tag;
use crate::types::version::BookmarkVersion;

/// Excludes tombstoned bookmarks. Every read path over `bookmarks b` applies it.
pub const LIVE_BOOKMARK: &str = "b.deleted_at IS NULL";

pub const BOOKMARK_COLUMNS: &str = "b.id, b.user_id, b.workspace_id, b.folder_id, b.type, b.title, \
     b.description, b.target_id, b.target_url, b.metadata, b.position, b.created_at, \
     b.updated_at, b.deleted_at";

pub const FOLDER_COLUMNS: &str = "id, user_id, workspace_id, name, parent_id, position, created_at";

pub const TAG_COLUMNS: &str = "t.id, t.user_id, t.workspace_id, t.name, t.color, t.created_at, t.updated_at";

pub const COLLECTION_COLUMNS: &str = "id, user_id, workspace_id, name, description, color, icon, \
     is_public, position, created_at, updated_at";

pub const VERSION_COLUMNS: &str = "id, bookmark_id, user_id, title, description, target_url, \
     metadata, version, change_note, created_at";

pub fn row_to_bookmark(row: &Row) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        id: row.get(0)?,
        user_id: row.get(1)?,
        workspace_id: row.get(2)?,
        folder_id: row.get(3)?,
        bookmark_type: row.get(4)?,
        title: row.get(5)?,
        description: row.get(6)?,
        target_id: row.get(7)?,
        target_url: row.get(8)?,
        metadata: row.get(9)?,
        position: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        deleted_at: row.get(13)?,
    })
}

pub fn row_to_folder(row: &Row) -> rusqlite::Result<BookmarkFolder> {
    Ok(BookmarkFolder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        workspace_id: row.get(2)?,
        name: row.get(3)?,
        parent_id: row.get(4)?,
        position: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        user_id: row.get(1)?,
        workspace_id: row.get(2)?,
        name: row.get(3)?,
        color: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn row_to_collection(row: &Row) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        user_id: row.get(1)?,
        workspace_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        color: row.get(5)?,
        icon: row.get(6)?,
        is_public: row.get(7)?,
        position: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub fn row_to_version(row: &Row) -> rusqlite::Result<BookmarkVersion> {
    Ok(BookmarkVersion {
        id: row.get(0)?,
        bookmark_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        target_url: row.get(5)?,
        metadata: row.get(6)?,
        version: row.get(7)?,
        change_note: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Escapes `%`, `_` and `\` so user input matches literally under `LIKE ... ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl ToSql for BookmarkType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BookmarkType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for ReminderStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReminderStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}
