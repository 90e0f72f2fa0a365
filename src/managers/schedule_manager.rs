//! Schedule Manager for MarkVault.
//!
//! Reminder and expiration state for an external timer. Nothing here runs on
//! a clock: the timer polls `due_reminders` / `expiring` and reports back with
//! `mark_fired` / `mark_expired`. Rows of tombstoned bookmarks are never due.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

use crate::database::rows::LIVE_BOOKMARK;
use crate::database::AssociationStore;
use crate::types::errors::ScheduleError;
use crate::types::schedule::{Expiration, Reminder, ReminderStatus};

/// Expiration action used when the caller does not pick one.
pub const DEFAULT_EXPIRATION_ACTION: &str = "archive";

const REMINDER_COLUMNS: &str =
    "r.id, r.bookmark_id, r.user_id, r.remind_at, r.message, r.status, r.fired_at, r.created_at";

const EXPIRATION_COLUMNS: &str =
    "e.id, e.bookmark_id, e.user_id, e.expires_at, e.action, e.is_expired, e.created_at, e.updated_at";

pub trait ScheduleManagerTrait {
    fn create_reminder(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        remind_at: i64,
        message: Option<&str>,
    ) -> Result<Reminder, ScheduleError>;
    fn get_reminder(&self, id: &str) -> Result<Reminder, ScheduleError>;
    /// Pending reminders with `remind_at <= before`, earliest first.
    fn due_reminders(&self, before: i64) -> Result<Vec<Reminder>, ScheduleError>;
    fn mark_fired(&mut self, id: &str) -> Result<Reminder, ScheduleError>;
    /// Cancels the bookmark's pending reminders. Returns how many changed.
    fn cancel_for_bookmark(&mut self, bookmark_id: &str) -> Result<usize, ScheduleError>;
    fn set_expiration(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        expires_at: i64,
        action: Option<&str>,
    ) -> Result<Expiration, ScheduleError>;
    /// Looks up by bookmark id; [`ScheduleError::NoExpiration`] when none is set.
    fn get_expiration(&self, bookmark_id: &str) -> Result<Expiration, ScheduleError>;
    /// Unexpired entries of a user with `expires_at <= before`, earliest first.
    fn expiring(&self, user_id: &str, before: i64) -> Result<Vec<Expiration>, ScheduleError>;
    /// Takes the expiration's own id; [`ScheduleError::ExpirationNotFound`] when unknown.
    fn mark_expired(&mut self, id: &str) -> Result<(), ScheduleError>;
}

pub struct ScheduleManager<'a> {
    conn: &'a Connection,
}

impl<'a> ScheduleManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn require_live_bookmark(&self, bookmark_id: &str) -> Result<(), ScheduleError> {
        if !AssociationStore::new(self.conn).is_live_bookmark(bookmark_id)? {
            return Err(ScheduleError::BookmarkNotFound(bookmark_id.to_string()));
        }
        Ok(())
    }

    fn row_to_reminder(row: &rusqlite::Row) -> rusqlite::Result<Reminder> {
        Ok(Reminder {
            id: row.get(0)?,
            bookmark_id: row.get(1)?,
            user_id: row.get(2)?,
            remind_at: row.get(3)?,
            message: row.get(4)?,
            status: row.get(5)?,
            fired_at: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn row_to_expiration(row: &rusqlite::Row) -> rusqlite::Result<Expiration> {
        Ok(Expiration {
            id: row.get(0)?,
            bookmark_id: row.get(1)?,
            user_id: row.get(2)?,
            expires_at: row.get(3)?,
            action: row.get(4)?,
            is_expired: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl<'a> ScheduleManagerTrait for ScheduleManager<'a> {
    fn create_reminder(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        remind_at: i64,
        message: Option<&str>,
    ) -> Result<Reminder, ScheduleError> {
        self.require_live_bookmark(bookmark_id)?;

        let reminder = Reminder {
            id: Uuid::new_v4().to_string(),
            bookmark_id: bookmark_id.to_string(),
            user_id: user_id.to_string(),
            remind_at,
            message: message.map(str::to_string),
            status: ReminderStatus::Pending,
            fired_at: None,
            created_at: Utc::now().timestamp_millis(),
        };
        self.conn.execute(
            "INSERT INTO reminders (id, bookmark_id, user_id, remind_at, message, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                reminder.id,
                reminder.bookmark_id,
                reminder.user_id,
                reminder.remind_at,
                reminder.message,
                reminder.status,
                reminder.created_at
            ],
        )?;

        info!(reminder_id = %reminder.id, bookmark_id, remind_at, "created reminder");
        Ok(reminder)
    }

    fn get_reminder(&self, id: &str) -> Result<Reminder, ScheduleError> {
        let sql = format!("SELECT {REMINDER_COLUMNS} FROM reminders r WHERE r.id = ?1");
        self.conn
            .query_row(&sql, params![id], Self::row_to_reminder)
            .optional()?
            .ok_or_else(|| ScheduleError::ReminderNotFound(id.to_string()))
    }

    fn due_reminders(&self, before: i64) -> Result<Vec<Reminder>, ScheduleError> {
        let sql = format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders r
             JOIN bookmarks b ON b.id = r.bookmark_id
             WHERE r.status = ?1 AND r.remind_at <= ?2 AND {LIVE_BOOKMARK}
             ORDER BY r.remind_at ASC, r.rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ReminderStatus::Pending, before], Self::row_to_reminder)?;

        let mut reminders = Vec::new();
        for row in rows {
            reminders.push(row?);
        }
        Ok(reminders)
    }

    /// Moves a pending reminder to `fired`. Any other status is a conflict.
    fn mark_fired(&mut self, id: &str) -> Result<Reminder, ScheduleError> {
        let affected = self.conn.execute(
            "UPDATE reminders SET status = ?1, fired_at = ?2 WHERE id = ?3 AND status = ?4",
            params![ReminderStatus::Fired, Utc::now().timestamp_millis(), id, ReminderStatus::Pending],
        )?;
        let reminder = self.get_reminder(id)?;
        if affected == 0 {
            return Err(ScheduleError::Conflict {
                id: id.to_string(),
                status: reminder.status.to_string(),
            });
        }
        Ok(reminder)
    }

    fn cancel_for_bookmark(&mut self, bookmark_id: &str) -> Result<usize, ScheduleError> {
        let cancelled = self.conn.execute(
            "UPDATE reminders SET status = ?1 WHERE bookmark_id = ?2 AND status = ?3",
            params![ReminderStatus::Cancelled, bookmark_id, ReminderStatus::Pending],
        )?;
        Ok(cancelled)
    }

    /// Creates or replaces the bookmark's single expiration. Replacing resets `is_expired`.
    fn set_expiration(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        expires_at: i64,
        action: Option<&str>,
    ) -> Result<Expiration, ScheduleError> {
        self.require_live_bookmark(bookmark_id)?;

        let now = Utc::now().timestamp_millis();
        let action = action.unwrap_or(DEFAULT_EXPIRATION_ACTION);
        self.conn.execute(
            "INSERT INTO expirations (id, bookmark_id, user_id, expires_at, action, is_expired, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
             ON CONFLICT(bookmark_id) DO UPDATE SET
                 user_id = excluded.user_id,
                 expires_at = excluded.expires_at,
                 action = excluded.action,
                 is_expired = 0,
                 updated_at = excluded.updated_at",
            params![Uuid::new_v4().to_string(), bookmark_id, user_id, expires_at, action, now],
        )?;
        self.get_expiration(bookmark_id)
    }

    fn get_expiration(&self, bookmark_id: &str) -> Result<Expiration, ScheduleError> {
        let sql = format!("SELECT {EXPIRATION_COLUMNS} FROM expirations e WHERE e.bookmark_id = ?1");
        self.conn
            .query_row(&sql, params![bookmark_id], Self::row_to_expiration)
            .optional()?
            .ok_or_else(|| ScheduleError::NoExpiration(bookmark_id.to_string()))
    }

    fn expiring(&self, user_id: &str, before: i64) -> Result<Vec<Expiration>, ScheduleError> {
        let sql = format!(
            "SELECT {EXPIRATION_COLUMNS} FROM expirations e
             JOIN bookmarks b ON b.id = e.bookmark_id
             WHERE e.user_id = ?1 AND e.is_expired = 0 AND e.expires_at <= ?2 AND {LIVE_BOOKMARK}
             ORDER BY e.expires_at ASC, e.rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, before], Self::row_to_expiration)?;

        let mut expirations = Vec::new();
        for row in rows {
            expirations.push(row?);
        }
        Ok(expirations)
    }

    fn mark_expired(&mut self, id: &str) -> Result<(), ScheduleError> {
        let affected = self.conn.execute(
            "UPDATE expirations SET is_expired = 1, updated_at = ?1 WHERE id = ?2",
            params![Utc::now().timestamp_millis(), id],
        )?;
        if affected == 0 {
            return Err(ScheduleError::ExpirationNotFound(id.to_string()));
        }
        Ok(())
    }
}
