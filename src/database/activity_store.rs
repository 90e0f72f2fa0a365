//! Activity Store for MarkVault.
//!
//! Append-only log of what happened to a bookmark. Reads join `bookmarks b`
//! and apply [`LIVE_BOOKMARK`], so a tombstoned bookmark's entries stop
//! showing up without being deleted.

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::rows::LIVE_BOOKMARK;
use crate::types::activity::BookmarkActivity;

const ACTIVITY_COLUMNS: &str = "a.id, a.bookmark_id, a.user_id, a.action, a.details, a.created_at";

/// Which side of the log a listing is keyed on.
#[derive(Debug, Clone, Copy)]
enum Scope {
    User,
    Bookmark,
}

impl Scope {
    fn column(self) -> &'static str {
        match self {
            Scope::User => "a.user_id",
            Scope::Bookmark => "a.bookmark_id",
        }
    }
}

pub struct ActivityStore<'a> {
    conn: &'a Connection,
}

impl<'a> ActivityStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Appends an entry. The caller checks that the bookmark is live.
    pub fn insert(
        &self,
        bookmark_id: &str,
        user_id: &str,
        action: &str,
        details: Option<&str>,
    ) -> rusqlite::Result<BookmarkActivity> {
        let activity = BookmarkActivity {
            id: Uuid::new_v4().to_string(),
            bookmark_id: bookmark_id.to_string(),
            user_id: user_id.to_string(),
            action: action.to_string(),
            details: details.map(str::to_string),
            created_at: Utc::now().timestamp_millis(),
        };
        self.conn.execute(
            "INSERT INTO bookmark_activity (id, bookmark_id, user_id, action, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                activity.id,
                activity.bookmark_id,
                activity.user_id,
                activity.action,
                activity.details,
                activity.created_at
            ],
        )?;
        Ok(activity)
    }

    pub fn count_for_user(&self, user_id: &str) -> rusqlite::Result<i64> {
        self.count(Scope::User, user_id)
    }

    /// A user's entries, newest first.
    pub fn list_for_user(&self, user_id: &str, limit: i64, offset: i64) -> rusqlite::Result<Vec<BookmarkActivity>> {
        self.list(Scope::User, user_id, limit, offset)
    }

    pub fn count_for_bookmark(&self, bookmark_id: &str) -> rusqlite::Result<i64> {
        self.count(Scope::Bookmark, bookmark_id)
    }

    /// A bookmark's entries, newest first.
    pub fn list_for_bookmark(
        &self,
        bookmark_id: &str,
        limit: i64,
        offset: i64,
    ) -> rusqlite::Result<Vec<BookmarkActivity>> {
        self.list(Scope::Bookmark, bookmark_id, limit, offset)
    }

    fn count(&self, scope: Scope, key: &str) -> rusqlite::Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM bookmark_activity a
             JOIN bookmarks b ON b.id = a.bookmark_id
             WHERE {} = ?1 AND {LIVE_BOOKMARK}",
            scope.column()
        );
        self.conn.query_row(&sql, params![key], |row| row.get(0))
    }

    fn list(&self, scope: Scope, key: &str, limit: i64, offset: i64) -> rusqlite::Result<Vec<BookmarkActivity>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM bookmark_activity a
             JOIN bookmarks b ON b.id = a.bookmark_id
             WHERE {} = ?1 AND {LIVE_BOOKMARK}
             ORDER BY a.created_at DESC, a.rowid DESC
             LIMIT ?2 OFFSET ?3",
            scope.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![key, limit, offset], |row| {
            Ok(BookmarkActivity {
                id: row.get(0)?,
                bookmark_id: row.get(1)?,
                user_id: row.get(2)?,
                action: row.get(3)?,
                details: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }
}
