//! Favorite Manager for MarkVault.
//!
//! Per-user favorite marks on live bookmarks. `add` is idempotent and the
//! favorites of a tombstoned bookmark drop out of every listing.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::info;
use uuid::Uuid;

use crate::database::rows::{row_to_bookmark, BOOKMARK_COLUMNS, LIVE_BOOKMARK};
use crate::database::AssociationStore;
use crate::types::bookmark::Bookmark;
use crate::types::errors::FavoriteError;
use crate::types::page::{Page, PageRequest};

pub trait FavoriteManagerTrait {
    /// Returns `true` when the mark was newly added.
    fn add(&mut self, user_id: &str, bookmark_id: &str) -> Result<bool, FavoriteError>;
    /// Returns `true` when a mark was removed.
    fn remove(&mut self, user_id: &str, bookmark_id: &str) -> Result<bool, FavoriteError>;
    fn is_favorite(&self, user_id: &str, bookmark_id: &str) -> Result<bool, FavoriteError>;
    fn list(&self, user_id: &str, page: PageRequest) -> Result<Page<Bookmark>, FavoriteError>;
}

pub struct FavoriteManager<'a> {
    conn: &'a Connection,
}

impl<'a> FavoriteManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> FavoriteManagerTrait for FavoriteManager<'a> {
    fn add(&mut self, user_id: &str, bookmark_id: &str) -> Result<bool, FavoriteError> {
        if !AssociationStore::new(self.conn).is_live_bookmark(bookmark_id)? {
            return Err(FavoriteError::BookmarkNotFound(bookmark_id.to_string()));
        }
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO favorites (id, user_id, bookmark_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![Uuid::new_v4().to_string(), user_id, bookmark_id, Utc::now().timestamp_millis()],
        )?;
        if inserted > 0 {
            info!(user_id, bookmark_id, "added favorite");
        }
        Ok(inserted > 0)
    }

    fn remove(&mut self, user_id: &str, bookmark_id: &str) -> Result<bool, FavoriteError> {
        let removed = self.conn.execute(
            "DELETE FROM favorites WHERE user_id = ?1 AND bookmark_id = ?2",
            params![user_id, bookmark_id],
        )?;
        Ok(removed > 0)
    }

    fn is_favorite(&self, user_id: &str, bookmark_id: &str) -> Result<bool, FavoriteError> {
        let sql = format!(
            "SELECT COUNT(*) FROM favorites f
             JOIN bookmarks b ON b.id = f.bookmark_id
             WHERE f.user_id = ?1 AND f.bookmark_id = ?2 AND {LIVE_BOOKMARK}"
        );
        let count: i64 = self.conn.query_row(&sql, params![user_id, bookmark_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Favorited bookmarks, most recently favorited first.
    fn list(&self, user_id: &str, page: PageRequest) -> Result<Page<Bookmark>, FavoriteError> {
        let count_sql = format!(
            "SELECT COUNT(*) FROM favorites f
             JOIN bookmarks b ON b.id = f.bookmark_id
             WHERE f.user_id = ?1 AND {LIVE_BOOKMARK}"
        );
        let total: i64 = self.conn.query_row(&count_sql, params![user_id], |row| row.get(0))?;

        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS} FROM favorites f
             JOIN bookmarks b ON b.id = f.bookmark_id
             WHERE f.user_id = ?1 AND {LIVE_BOOKMARK}
             ORDER BY f.created_at DESC, f.rowid DESC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, page.limit(), page.offset()], row_to_bookmark)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(Page::new(items, total, page))
    }
}
