//! Version Store for MarkVault.
//!
//! Append-only storage for bookmark snapshots. Rows are inserted and read,
//! never updated or deleted. `UNIQUE(bookmark_id, version)` backs the
//! gap-free numbering computed by the version manager.

use rusqlite::{params, Connection, OptionalExtension};

use super::rows::{row_to_version, LIVE_BOOKMARK, VERSION_COLUMNS};
use crate::types::version::BookmarkVersion;

pub struct VersionStore<'a> {
    conn: &'a Connection,
}

impl<'a> VersionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Highest recorded version for a bookmark, 0 when it has no history.
    pub fn max_version(&self, bookmark_id: &str) -> rusqlite::Result<i64> {
        self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM bookmark_versions WHERE bookmark_id = ?1",
            params![bookmark_id],
            |row| row.get(0),
        )
    }

    pub fn insert(&self, version: &BookmarkVersion) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO bookmark_versions
             (id, bookmark_id, user_id, title, description, target_url, metadata, version, change_note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                version.id,
                version.bookmark_id,
                version.user_id,
                version.title,
                version.description,
                version.target_url,
                version.metadata,
                version.version,
                version.change_note,
                version.created_at,
            ],
        )?;
        Ok(())
    }

    /// Loads a version whose bookmark is still live.
    pub fn get(&self, id: &str) -> rusqlite::Result<Option<BookmarkVersion>> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM bookmark_versions
             WHERE id = ?1 AND EXISTS (
                 SELECT 1 FROM bookmarks b WHERE b.id = bookmark_versions.bookmark_id AND {LIVE_BOOKMARK}
             )"
        );
        self.conn
            .query_row(&sql, params![id], row_to_version)
            .optional()
    }

    /// Versions of a live bookmark, highest version first.
    pub fn list(
        &self,
        bookmark_id: &str,
        limit: i64,
        offset: i64,
    ) -> rusqlite::Result<Vec<BookmarkVersion>> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM bookmark_versions
             WHERE bookmark_id = ?1 AND EXISTS (
                 SELECT 1 FROM bookmarks b WHERE b.id = ?1 AND {LIVE_BOOKMARK}
             )
             ORDER BY version DESC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![bookmark_id, limit, offset], row_to_version)?;
        let mut versions = Vec::new();
        for row in rows {
            versions.push(row?);
        }
        Ok(versions)
    }

    pub fn count(&self, bookmark_id: &str) -> rusqlite::Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM bookmark_versions
             WHERE bookmark_id = ?1 AND EXISTS (
                 SELECT 1 FROM bookmarks b WHERE b.id = ?1 AND {LIVE_BOOKMARK}
             )"
        );
        self.conn.query_row(&sql, params![bookmark_id], |row| row.get(0))
    }

    /// Every recorded version number for a bookmark, ascending.
    pub fn version_numbers(&self, bookmark_id: &str) -> rusqlite::Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT version FROM bookmark_versions WHERE bookmark_id = ?1 ORDER BY version ASC",
        )?;
        let rows = stmt.query_map(params![bookmark_id], |row| row.get(0))?;
        let mut numbers = Vec::new();
        for row in rows {
            numbers.push(row?);
        }
        Ok(numbers)
    }
}
