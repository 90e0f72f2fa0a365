//! Sharing Manager for MarkVault.
//!
//! One user offers a live bookmark to another; the recipient accepts or
//! declines. A bookmark is shared with a given user at most once
//! (`UNIQUE(bookmark_id, shared_with)`), and declining deletes the share so it
//! can be offered again. Shares of a tombstoned bookmark drop out of every
//! listing and count.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

use crate::database::rows::LIVE_BOOKMARK;
use crate::managers::bookmark_store::BookmarkStore;
use crate::types::errors::SharingError;
use crate::types::page::{Page, PageRequest};
use crate::types::sharing::SharedBookmark;

const SHARE_COLUMNS: &str = "s.id, s.bookmark_id, s.shared_by, s.shared_with, s.workspace_id, \
     s.message, s.is_accepted, s.created_at, s.updated_at";

pub trait SharingManagerTrait {
    /// Offers `bookmark_id` to `shared_with`. Sharing the same bookmark with
    /// the same user twice is a conflict.
    fn share(
        &mut self,
        bookmark_id: &str,
        shared_by: &str,
        shared_with: &str,
        message: Option<&str>,
    ) -> Result<SharedBookmark, SharingError>;
    fn get_share(&self, id: &str) -> Result<SharedBookmark, SharingError>;
    /// Accepting an already accepted share is a conflict.
    fn accept(&mut self, id: &str) -> Result<SharedBookmark, SharingError>;
    /// Removes the share.
    fn decline(&mut self, id: &str) -> Result<(), SharingError>;
    /// Shares received by `user_id`, newest first.
    fn shared_with(&self, user_id: &str, page: PageRequest) -> Result<Page<SharedBookmark>, SharingError>;
    /// Shares sent by `user_id`, newest first.
    fn shared_by(&self, user_id: &str, page: PageRequest) -> Result<Page<SharedBookmark>, SharingError>;
    /// Received shares not yet accepted.
    fn pending_count(&self, user_id: &str) -> Result<i64, SharingError>;
}

pub struct SharingManager<'a, S: BookmarkStore> {
    conn: &'a Connection,
    store: &'a S,
}

impl<'a, S: BookmarkStore> SharingManager<'a, S> {
    pub fn new(conn: &'a Connection, store: &'a S) -> Self {
        Self { conn, store }
    }

    fn row_to_share(row: &rusqlite::Row) -> rusqlite::Result<SharedBookmark> {
        Ok(SharedBookmark {
            id: row.get(0)?,
            bookmark_id: row.get(1)?,
            shared_by: row.get(2)?,
            shared_with: row.get(3)?,
            workspace_id: row.get(4)?,
            message: row.get(5)?,
            is_accepted: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    /// Pages shares where `column` equals `user_id`.
    fn list_by(&self, column: &str, user_id: &str, page: PageRequest) -> Result<Page<SharedBookmark>, SharingError> {
        let count_sql = format!(
            "SELECT COUNT(*) FROM shared_bookmarks s
             JOIN bookmarks b ON b.id = s.bookmark_id
             WHERE s.{column} = ?1 AND {LIVE_BOOKMARK}"
        );
        let total: i64 = self.conn.query_row(&count_sql, params![user_id], |row| row.get(0))?;

        let sql = format!(
            "SELECT {SHARE_COLUMNS} FROM shared_bookmarks s
             JOIN bookmarks b ON b.id = s.bookmark_id
             WHERE s.{column} = ?1 AND {LIVE_BOOKMARK}
             ORDER BY s.created_at DESC, s.rowid DESC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, page.limit(), page.offset()], Self::row_to_share)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(Page::new(items, total, page))
    }
}

impl<'a, S: BookmarkStore> SharingManagerTrait for SharingManager<'a, S> {
    fn share(
        &mut self,
        bookmark_id: &str,
        shared_by: &str,
        shared_with: &str,
        message: Option<&str>,
    ) -> Result<SharedBookmark, SharingError> {
        let bookmark = self.store.get(bookmark_id)?;

        let now = Utc::now().timestamp_millis();
        let share = SharedBookmark {
            id: Uuid::new_v4().to_string(),
            bookmark_id: bookmark.id,
            shared_by: shared_by.to_string(),
            shared_with: shared_with.to_string(),
            workspace_id: bookmark.workspace_id,
            message: message.map(str::to_string),
            is_accepted: false,
            created_at: now,
            updated_at: now,
        };
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO shared_bookmarks
             (id, bookmark_id, shared_by, shared_with, workspace_id, message, is_accepted, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)",
            params![
                share.id,
                share.bookmark_id,
                share.shared_by,
                share.shared_with,
                share.workspace_id,
                share.message,
                now
            ],
        )?;
        if inserted == 0 {
            return Err(SharingError::Conflict(format!(
                "bookmark {} already shared with {}",
                bookmark_id, shared_with
            )));
        }

        info!(bookmark_id, shared_by, shared_with, "shared bookmark");
        Ok(share)
    }

    fn get_share(&self, id: &str) -> Result<SharedBookmark, SharingError> {
        let sql = format!(
            "SELECT {SHARE_COLUMNS} FROM shared_bookmarks s
             JOIN bookmarks b ON b.id = s.bookmark_id
             WHERE s.id = ?1 AND {LIVE_BOOKMARK}"
        );
        self.conn
            .query_row(&sql, params![id], Self::row_to_share)
            .optional()?
            .ok_or_else(|| SharingError::NotFound(id.to_string()))
    }

    fn accept(&mut self, id: &str) -> Result<SharedBookmark, SharingError> {
        let share = self.get_share(id)?;
        if share.is_accepted {
            return Err(SharingError::Conflict(format!("share {} already accepted", id)));
        }
        let affected = self.conn.execute(
            "UPDATE shared_bookmarks SET is_accepted = 1, updated_at = ?1 WHERE id = ?2 AND is_accepted = 0",
            params![Utc::now().timestamp_millis(), id],
        )?;
        if affected == 0 {
            return Err(SharingError::Conflict(format!("share {} already accepted", id)));
        }

        info!(share_id = id, bookmark_id = %share.bookmark_id, "accepted share");
        self.get_share(id)
    }

    fn decline(&mut self, id: &str) -> Result<(), SharingError> {
        let share = self.get_share(id)?;
        self.conn
            .execute("DELETE FROM shared_bookmarks WHERE id = ?1", params![id])?;
        info!(share_id = id, bookmark_id = %share.bookmark_id, "declined share");
        Ok(())
    }

    fn shared_with(&self, user_id: &str, page: PageRequest) -> Result<Page<SharedBookmark>, SharingError> {
        self.list_by("shared_with", user_id, page)
    }

    fn shared_by(&self, user_id: &str, page: PageRequest) -> Result<Page<SharedBookmark>, SharingError> {
        self.list_by("shared_by", user_id, page)
    }

    fn pending_count(&self, user_id: &str) -> Result<i64, SharingError> {
        let sql = format!(
            "SELECT COUNT(*) FROM shared_bookmarks s
             JOIN bookmarks b ON b.id = s.bookmark_id
             WHERE s.shared_with = ?1 AND s.is_accepted = 0 AND {LIVE_BOOKMARK}"
        );
        Ok(self.conn.query_row(&sql, params![user_id], |row| row.get(0))?)
    }
}
