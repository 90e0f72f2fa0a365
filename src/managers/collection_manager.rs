//! Collection Manager for MarkVault.
//!
//! Implements `CollectionManagerTrait`: CRUD for collections plus ordered,
//! idempotent membership through the association store. New members are
//! appended at the next position and removals leave gaps in place.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::rows::{row_to_collection, COLLECTION_COLUMNS};
use crate::database::AssociationStore;
use crate::types::bookmark::Bookmark;
use crate::types::collection::{Collection, CollectionMembership, CollectionUpdate, NewCollection};
use crate::types::errors::{CollectionError, ErrorKind};
use crate::types::page::{BatchResult, Page, PageRequest};

/// Trait defining collection management operations.
pub trait CollectionManagerTrait {
    fn create_collection(&mut self, new: NewCollection) -> Result<Collection, CollectionError>;
    fn get_collection(&self, id: &str) -> Result<Collection, CollectionError>;
    fn update_collection(&mut self, id: &str, update: CollectionUpdate) -> Result<Collection, CollectionError>;
    fn delete_collection(&mut self, id: &str) -> Result<(), CollectionError>;
    fn list_collections(&self, user_id: &str, workspace_id: Option<&str>) -> Result<Vec<Collection>, CollectionError>;
    fn list_public_by_workspace(&self, workspace_id: &str, page: PageRequest) -> Result<Page<Collection>, CollectionError>;
    fn add_bookmarks(&mut self, collection_id: &str, bookmark_ids: &[String]) -> Result<BatchResult, CollectionError>;
    fn remove_bookmark(&mut self, collection_id: &str, bookmark_id: &str) -> Result<(), CollectionError>;
    fn list_bookmarks(&self, collection_id: &str, page: PageRequest) -> Result<Page<Bookmark>, CollectionError>;
    fn memberships(&self, collection_id: &str) -> Result<Vec<CollectionMembership>, CollectionError>;
    fn count_bookmarks(&self, collection_id: &str) -> Result<i64, CollectionError>;
}

/// Collection manager backed by a SQLite connection.
pub struct CollectionManager<'a> {
    conn: &'a Connection,
    links: AssociationStore<'a>,
}

impl<'a> CollectionManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            links: AssociationStore::new(conn),
        }
    }

    fn require_collection(&self, id: &str) -> Result<(), CollectionError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM collections WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(CollectionError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Computes the next position among the owner's collections.
    fn next_collection_position(&self, user_id: &str, workspace_id: &str) -> Result<i32, CollectionError> {
        let pos: i32 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM collections WHERE user_id = ?1 AND workspace_id = ?2",
            params![user_id, workspace_id],
            |row| row.get(0),
        )?;
        Ok(pos)
    }

    /// Adds one bookmark, recording the outcome in `result`.
    fn add_one(&self, collection_id: &str, bookmark_id: &str, result: &mut BatchResult) -> Result<(), CollectionError> {
        if !self.links.is_live_bookmark(bookmark_id)? {
            let err = CollectionError::BookmarkNotFound(bookmark_id.to_string());
            warn!(collection_id, bookmark_id, "skipping collection add: bookmark not found");
            result.fail(bookmark_id, ErrorKind::NotFound, err.to_string());
            return Ok(());
        }
        if self.links.has_member(collection_id, bookmark_id)? {
            result.skipped += 1;
            return Ok(());
        }
        let position = self.links.next_member_position(collection_id)?;
        if self.links.add_member(collection_id, bookmark_id, position)? {
            result.applied += 1;
        } else {
            result.skipped += 1;
        }
        Ok(())
    }
}

impl<'a> CollectionManagerTrait for CollectionManager<'a> {
    fn create_collection(&mut self, new: NewCollection) -> Result<Collection, CollectionError> {
        let now = Utc::now().timestamp_millis();
        let position = self.next_collection_position(&new.user_id, &new.workspace_id)?;
        let collection = Collection {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            workspace_id: new.workspace_id,
            name: new.name,
            description: new.description,
            color: new.color,
            icon: new.icon,
            is_public: new.is_public,
            position,
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO collections
             (id, user_id, workspace_id, name, description, color, icon, is_public, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                collection.id,
                collection.user_id,
                collection.workspace_id,
                collection.name,
                collection.description,
                collection.color,
                collection.icon,
                collection.is_public,
                collection.position,
                collection.created_at,
                collection.updated_at
            ],
        )?;

        info!(collection_id = %collection.id, user_id = %collection.user_id, "created collection");
        Ok(collection)
    }

    fn get_collection(&self, id: &str) -> Result<Collection, CollectionError> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], row_to_collection)
            .optional()?
            .ok_or_else(|| CollectionError::NotFound(id.to_string()))
    }

    fn update_collection(&mut self, id: &str, update: CollectionUpdate) -> Result<Collection, CollectionError> {
        let mut collection = self.get_collection(id)?;
        if let Some(name) = update.name {
            collection.name = name;
        }
        if let Some(description) = update.description {
            collection.description = description;
        }
        if let Some(color) = update.color {
            collection.color = Some(color);
        }
        if let Some(icon) = update.icon {
            collection.icon = Some(icon);
        }
        if let Some(is_public) = update.is_public {
            collection.is_public = is_public;
        }
        if let Some(position) = update.position {
            collection.position = position;
        }
        collection.updated_at = Utc::now().timestamp_millis();

        self.conn.execute(
            "UPDATE collections SET name = ?1, description = ?2, color = ?3, icon = ?4,
                 is_public = ?5, position = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                collection.name,
                collection.description,
                collection.color,
                collection.icon,
                collection.is_public,
                collection.position,
                collection.updated_at,
                collection.id
            ],
        )?;
        Ok(collection)
    }

    /// Removes all memberships, then the collection.
    fn delete_collection(&mut self, id: &str) -> Result<(), CollectionError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = AssociationStore::new(&tx).remove_all_members(id)?;
        let affected = tx.execute("DELETE FROM collections WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(CollectionError::NotFound(id.to_string()));
        }
        tx.commit()?;

        info!(collection_id = id, removed, "deleted collection");
        Ok(())
    }

    /// The owner's collections by position, then name.
    fn list_collections(&self, user_id: &str, workspace_id: Option<&str>) -> Result<Vec<Collection>, CollectionError> {
        let sql = format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections
             WHERE user_id = ?1 AND (?2 IS NULL OR workspace_id = ?2)
             ORDER BY position ASC, name ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, workspace_id], row_to_collection)?;

        let mut collections = Vec::new();
        for row in rows {
            collections.push(row?);
        }
        Ok(collections)
    }

    /// Public collections of a workspace, newest first. Private ones never appear.
    fn list_public_by_workspace(&self, workspace_id: &str, page: PageRequest) -> Result<Page<Collection>, CollectionError> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM collections WHERE workspace_id = ?1 AND is_public = 1",
            params![workspace_id],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections
             WHERE workspace_id = ?1 AND is_public = 1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![workspace_id, page.limit(), page.offset()], row_to_collection)?;

        let mut collections = Vec::new();
        for row in rows {
            collections.push(row?);
        }
        Ok(Page::new(collections, total, page))
    }

    /// Appends each bookmark not already present. Ids repeated within the call,
    /// or already in the collection, count as skipped.
    fn add_bookmarks(&mut self, collection_id: &str, bookmark_ids: &[String]) -> Result<BatchResult, CollectionError> {
        self.require_collection(collection_id)?;

        let mut result = BatchResult::default();
        for bookmark_id in bookmark_ids {
            if let Err(e) = self.add_one(collection_id, bookmark_id, &mut result) {
                warn!(collection_id, bookmark_id = %bookmark_id, error = %e, "skipping collection add");
                result.fail(bookmark_id, ErrorKind::StorageFailure, e.to_string());
            }
        }
        info!(collection_id, applied = result.applied, skipped = result.skipped, "added bookmarks to collection");
        Ok(result)
    }

    fn remove_bookmark(&mut self, collection_id: &str, bookmark_id: &str) -> Result<(), CollectionError> {
        self.links.remove_member(collection_id, bookmark_id)?;
        Ok(())
    }

    /// Members by position ascending.
    fn list_bookmarks(&self, collection_id: &str, page: PageRequest) -> Result<Page<Bookmark>, CollectionError> {
        self.require_collection(collection_id)?;
        let total = self.links.count_members(collection_id)?;
        let items = self.links.members(collection_id, page.limit(), page.offset())?;
        Ok(Page::new(items, total, page))
    }

    fn memberships(&self, collection_id: &str) -> Result<Vec<CollectionMembership>, CollectionError> {
        self.require_collection(collection_id)?;
        Ok(self.links.memberships(collection_id)?)
    }

    fn count_bookmarks(&self, collection_id: &str) -> Result<i64, CollectionError> {
        self.require_collection(collection_id)?;
        Ok(self.links.count_members(collection_id)?)
    }
}
