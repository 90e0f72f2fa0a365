//! Version Manager for MarkVault.
//!
//! Implements `VersionManagerTrait`: snapshot-on-write and restore over the
//! version store and a [`BookmarkStore`].
//!
//! Version numbers for a bookmark are exactly `1..=N`. The "read max, write
//! max + 1" step runs inside a `BEGIN IMMEDIATE` transaction, so the write
//! lock is held before the max is read; `UNIQUE(bookmark_id, version)` turns
//! any remaining collision into [`VersionError::Conflict`].

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::{ActivityStore, VersionStore};
use crate::managers::bookmark_store::BookmarkStore;
use crate::types::activity::ACTION_RESTORED;
use crate::types::bookmark::Bookmark;
use crate::types::errors::VersionError;
use crate::types::page::{Page, PageRequest};
use crate::types::version::{BookmarkVersion, BEFORE_RESTORE_NOTE};

/// Trait defining version history operations.
pub trait VersionManagerTrait {
    /// Records the bookmark's current editable fields as the next version.
    fn snapshot(
        &mut self,
        bookmark: &Bookmark,
        user_id: &str,
        change_note: Option<&str>,
    ) -> Result<BookmarkVersion, VersionError>;
    /// Loads the bookmark from the store and snapshots it.
    fn snapshot_by_id(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        change_note: Option<&str>,
    ) -> Result<BookmarkVersion, VersionError>;
    /// Copies a version's fields back onto the bookmark after snapshotting
    /// the pre-restore state.
    fn restore(&mut self, bookmark_id: &str, version_id: &str) -> Result<Bookmark, VersionError>;
    fn get_version(&self, id: &str) -> Result<BookmarkVersion, VersionError>;
    fn list_versions(&self, bookmark_id: &str, page: PageRequest) -> Result<Page<BookmarkVersion>, VersionError>;
}

pub struct VersionManager<'a, S: BookmarkStore> {
    conn: &'a Connection,
    versions: VersionStore<'a>,
    activity: ActivityStore<'a>,
    store: &'a S,
}

impl<'a, S: BookmarkStore> VersionManager<'a, S> {
    /// `store` must write through `conn`, so its writes join the transactions
    /// opened here.
    pub fn new(conn: &'a Connection, store: &'a S) -> Self {
        Self {
            conn,
            versions: VersionStore::new(conn),
            activity: ActivityStore::new(conn),
            store,
        }
    }

    fn begin_immediate(&self) -> Result<Transaction<'a>, VersionError> {
        Ok(Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?)
    }

    /// Appends the next version. Callers hold an IMMEDIATE transaction.
    fn append(
        &self,
        bookmark: &Bookmark,
        user_id: &str,
        change_note: Option<&str>,
    ) -> Result<BookmarkVersion, VersionError> {
        let next = self.versions.max_version(&bookmark.id)? + 1;
        let version = BookmarkVersion {
            id: Uuid::new_v4().to_string(),
            bookmark_id: bookmark.id.clone(),
            user_id: user_id.to_string(),
            title: bookmark.title.clone(),
            description: bookmark.description.clone(),
            target_url: bookmark.target_url.clone(),
            metadata: bookmark.metadata.clone(),
            version: next,
            change_note: change_note.map(str::to_string),
            created_at: Utc::now().timestamp_millis(),
        };

        self.versions.insert(&version).map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
                VersionError::Conflict(format!("version {} of bookmark {} already exists", next, bookmark.id))
            }
            other => VersionError::Storage(other),
        })?;

        debug!(bookmark_id = %bookmark.id, version = next, "recorded bookmark version");
        Ok(version)
    }
}

impl<'a, S: BookmarkStore> VersionManagerTrait for VersionManager<'a, S> {
    fn snapshot(
        &mut self,
        bookmark: &Bookmark,
        user_id: &str,
        change_note: Option<&str>,
    ) -> Result<BookmarkVersion, VersionError> {
        let tx = self.begin_immediate()?;
        // The lineage must still be live; a stale value may have been deleted since it was read.
        self.store.get(&bookmark.id)?;
        let version = self.append(bookmark, user_id, change_note)?;
        tx.commit()?;
        Ok(version)
    }

    fn snapshot_by_id(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        change_note: Option<&str>,
    ) -> Result<BookmarkVersion, VersionError> {
        let tx = self.begin_immediate()?;
        let bookmark = self.store.get(bookmark_id)?;
        let version = self.append(&bookmark, user_id, change_note)?;
        tx.commit()?;
        Ok(version)
    }

    /// Only `title`, `description`, `target_url` and `metadata` are copied back;
    /// folder, type, position and target id stay as they are. Loading the
    /// current bookmark, the pre-restore snapshot, the write and the
    /// `restored` activity entry share one IMMEDIATE transaction.
    fn restore(&mut self, bookmark_id: &str, version_id: &str) -> Result<Bookmark, VersionError> {
        let target = self
            .versions
            .get(version_id)?
            .filter(|v| v.bookmark_id == bookmark_id)
            .ok_or_else(|| VersionError::NotFound(version_id.to_string()))?;

        let tx = self.begin_immediate()?;
        let current = self.store.get(bookmark_id)?;
        let before = self.append(&current, &current.user_id, Some(BEFORE_RESTORE_NOTE))?;

        let mut restored = current;
        restored.title = target.title;
        restored.description = target.description;
        restored.target_url = target.target_url;
        restored.metadata = target.metadata;
        let updated = self.store.update(&restored)?;
        self.activity.insert(
            bookmark_id,
            &updated.user_id,
            ACTION_RESTORED,
            Some(format!("version {}", target.version).as_str()),
        )?;
        tx.commit()?;

        info!(
            bookmark_id,
            restored_version = target.version,
            snapshot_version = before.version,
            "restored bookmark"
        );
        Ok(updated)
    }

    fn get_version(&self, id: &str) -> Result<BookmarkVersion, VersionError> {
        self.versions
            .get(id)?
            .ok_or_else(|| VersionError::NotFound(id.to_string()))
    }

    /// Highest version first. A tombstoned bookmark yields an empty page.
    fn list_versions(&self, bookmark_id: &str, page: PageRequest) -> Result<Page<BookmarkVersion>, VersionError> {
        let total = self.versions.count(bookmark_id)?;
        let items = self.versions.list(bookmark_id, page.limit(), page.offset())?;
        Ok(Page::new(items, total, page))
    }
}
