//! Bookmark Store for MarkVault.
//!
//! Defines `BookmarkStore`, the collaborator that owns the mutable bookmark
//! record, and `SqliteBookmarkStore`, its SQLite implementation. Deletes are
//! soft: `soft_delete` stamps `deleted_at` and every read filters on
//! [`LIVE_BOOKMARK`]. The store also keeps the folder tree that bookmarks
//! are filed under.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::rows::{
    row_to_bookmark, row_to_folder, BOOKMARK_COLUMNS, FOLDER_COLUMNS, LIVE_BOOKMARK,
};
use crate::types::bookmark::{Bookmark, BookmarkFolder, NewBookmark};
use crate::types::errors::StoreError;

/// Read/write access to the current state of a bookmark.
///
/// Managers take an implementation as a constructor parameter, so the engine
/// never reaches for a bookmark schema of its own.
pub trait BookmarkStore {
    /// Loads a live bookmark. Tombstoned and unknown ids are `NotFound`.
    fn get(&self, id: &str) -> Result<Bookmark, StoreError>;
    /// Creates a bookmark appended at the next position of its folder.
    fn create(&self, new: NewBookmark) -> Result<Bookmark, StoreError>;
    /// Persists the editable fields of `bookmark` and returns the stored row.
    fn update(&self, bookmark: &Bookmark) -> Result<Bookmark, StoreError>;
    fn soft_delete(&self, id: &str) -> Result<(), StoreError>;
    /// Live bookmarks of a user, oldest first.
    fn list_by_user(
        &self,
        user_id: &str,
        workspace_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Bookmark>, StoreError>;
}

/// Bookmark store backed by a SQLite connection.
pub struct SqliteBookmarkStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBookmarkStore<'a> {
    /// Creates a new `SqliteBookmarkStore` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Computes the next position value for a bookmark in the given folder.
    fn next_bookmark_position(
        &self,
        user_id: &str,
        folder_id: Option<&str>,
    ) -> Result<i32, StoreError> {
        let pos: i32 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM bookmarks
             WHERE user_id = ?1 AND folder_id IS ?2",
            params![user_id, folder_id],
            |row| row.get(0),
        )?;
        Ok(pos)
    }

    /// Computes the next position value for a folder under the given parent.
    fn next_folder_position(
        &self,
        user_id: &str,
        parent_id: Option<&str>,
    ) -> Result<i32, StoreError> {
        let pos: i32 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM bookmark_folders
             WHERE user_id = ?1 AND parent_id IS ?2",
            params![user_id, parent_id],
            |row| row.get(0),
        )?;
        Ok(pos)
    }

    /// Checks whether a folder with the given ID exists.
    pub fn folder_exists(&self, folder_id: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bookmark_folders WHERE id = ?1",
            params![folder_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn require_folder(&self, folder_id: Option<&str>) -> Result<(), StoreError> {
        if let Some(fid) = folder_id {
            if !self.folder_exists(fid)? {
                return Err(StoreError::FolderNotFound(fid.to_string()));
            }
        }
        Ok(())
    }

    /// Creates a folder appended after its siblings.
    pub fn create_folder(
        &self,
        user_id: &str,
        workspace_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<BookmarkFolder, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("folder name is empty".to_string()));
        }
        self.require_folder(parent_id)?;

        let folder = BookmarkFolder {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
            position: self.next_folder_position(user_id, parent_id)?,
            created_at: Utc::now().timestamp_millis(),
        };

        self.conn.execute(
            "INSERT INTO bookmark_folders (id, user_id, workspace_id, name, parent_id, position, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                folder.id,
                folder.user_id,
                folder.workspace_id,
                folder.name,
                folder.parent_id,
                folder.position,
                folder.created_at
            ],
        )?;

        info!(folder_id = %folder.id, user_id, "created bookmark folder");
        Ok(folder)
    }

    /// Folders of a user, optionally narrowed to one workspace.
    pub fn list_folders(
        &self,
        user_id: &str,
        workspace_id: Option<&str>,
    ) -> Result<Vec<BookmarkFolder>, StoreError> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM bookmark_folders
             WHERE user_id = ?1 AND (?2 IS NULL OR workspace_id = ?2)
             ORDER BY position ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, workspace_id], row_to_folder)?;

        let mut folders = Vec::new();
        for row in rows {
            folders.push(row?);
        }
        Ok(folders)
    }
}

impl<'a> BookmarkStore for SqliteBookmarkStore<'a> {
    fn get(&self, id: &str) -> Result<Bookmark, StoreError> {
        let sql = format!("SELECT {BOOKMARK_COLUMNS} FROM bookmarks b WHERE b.id = ?1 AND {LIVE_BOOKMARK}");
        self.conn
            .query_row(&sql, params![id], row_to_bookmark)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn create(&self, new: NewBookmark) -> Result<Bookmark, StoreError> {
        if new.title.trim().is_empty() {
            return Err(StoreError::InvalidArgument("title is empty".to_string()));
        }
        if new.target_id.is_empty() {
            return Err(StoreError::InvalidArgument("target id is empty".to_string()));
        }
        self.require_folder(new.folder_id.as_deref())?;

        let now = Utc::now().timestamp_millis();
        let position = self.next_bookmark_position(&new.user_id, new.folder_id.as_deref())?;
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            workspace_id: new.workspace_id,
            folder_id: new.folder_id,
            bookmark_type: new.bookmark_type,
            title: new.title,
            description: new.description,
            target_id: new.target_id,
            target_url: new.target_url,
            metadata: new.metadata,
            position,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.conn.execute(
            "INSERT INTO bookmarks
             (id, user_id, workspace_id, folder_id, type, title, description, target_id,
              target_url, metadata, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                bookmark.id,
                bookmark.user_id,
                bookmark.workspace_id,
                bookmark.folder_id,
                bookmark.bookmark_type,
                bookmark.title,
                bookmark.description,
                bookmark.target_id,
                bookmark.target_url,
                bookmark.metadata,
                bookmark.position,
                bookmark.created_at,
                bookmark.updated_at
            ],
        )?;

        info!(bookmark_id = %bookmark.id, user_id = %bookmark.user_id, kind = %bookmark.bookmark_type, "created bookmark");
        Ok(bookmark)
    }

    fn update(&self, bookmark: &Bookmark) -> Result<Bookmark, StoreError> {
        self.require_folder(bookmark.folder_id.as_deref())?;

        let now = Utc::now().timestamp_millis();
        let sql = format!(
            "UPDATE bookmarks AS b SET folder_id = ?1, title = ?2, description = ?3, target_url = ?4,
                 metadata = ?5, position = ?6, updated_at = ?7
             WHERE b.id = ?8 AND {LIVE_BOOKMARK}"
        );
        let affected = self.conn.execute(
            &sql,
            params![
                bookmark.folder_id,
                bookmark.title,
                bookmark.description,
                bookmark.target_url,
                bookmark.metadata,
                bookmark.position,
                now,
                bookmark.id
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound(bookmark.id.clone()));
        }
        debug!(bookmark_id = %bookmark.id, "updated bookmark");
        self.get(&bookmark.id)
    }

    fn soft_delete(&self, id: &str) -> Result<(), StoreError> {
        let sql = format!("UPDATE bookmarks AS b SET deleted_at = ?1 WHERE b.id = ?2 AND {LIVE_BOOKMARK}");
        let affected = self
            .conn
            .execute(&sql, params![Utc::now().timestamp_millis(), id])?;

        if affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        info!(bookmark_id = id, "deleted bookmark");
        Ok(())
    }

    fn list_by_user(
        &self,
        user_id: &str,
        workspace_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Bookmark>, StoreError> {
        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks b
             WHERE b.user_id = ?1 AND (?2 IS NULL OR b.workspace_id = ?2) AND {LIVE_BOOKMARK}
             ORDER BY b.created_at ASC, b.rowid ASC
             LIMIT ?3 OFFSET ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, workspace_id, limit, offset], row_to_bookmark)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}
