//! Tag Manager for MarkVault.
//!
//! Implements `TagManagerTrait` over the tag side of the association store.
//! Tag names are not unique: `create_tag` always inserts a new row.
//!
//! Batch attach is best effort. Each id is attempted on its own, failures are
//! logged at WARN and returned in the [`BatchResult`], and items already
//! applied stay applied. `replace_tags` and `delete_tag` run in a single
//! transaction instead.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::rows::{row_to_tag, TAG_COLUMNS};
use crate::database::AssociationStore;
use crate::types::bookmark::Bookmark;
use crate::types::errors::{Classify, ErrorKind, TagError};
use crate::types::page::{BatchResult, Page, PageRequest};
use crate::types::tag::{Tag, TagUpdate};

/// Trait defining tag management operations.
pub trait TagManagerTrait {
    fn create_tag(
        &mut self,
        user_id: &str,
        workspace_id: &str,
        name: &str,
        color: Option<&str>,
    ) -> Result<Tag, TagError>;
    fn get_tag(&self, id: &str) -> Result<Tag, TagError>;
    fn list_tags(&self, user_id: &str, workspace_id: Option<&str>) -> Result<Vec<Tag>, TagError>;
    fn update_tag(&mut self, id: &str, update: TagUpdate) -> Result<Tag, TagError>;
    fn delete_tag(&mut self, id: &str) -> Result<(), TagError>;
    fn attach_tags(&mut self, bookmark_id: &str, tag_ids: &[String]) -> Result<BatchResult, TagError>;
    fn bulk_attach(&mut self, bookmark_ids: &[String], tag_id: &str) -> Result<BatchResult, TagError>;
    fn replace_tags(&mut self, bookmark_id: &str, tag_ids: &[String]) -> Result<Vec<Tag>, TagError>;
    fn detach_tag(&mut self, bookmark_id: &str, tag_id: &str) -> Result<(), TagError>;
    fn list_tags_for_bookmark(&self, bookmark_id: &str) -> Result<Vec<Tag>, TagError>;
    fn list_bookmarks_for_tag(&self, tag_id: &str, page: PageRequest) -> Result<Page<Bookmark>, TagError>;
}

/// Tag manager backed by a SQLite connection.
pub struct TagManager<'a> {
    conn: &'a Connection,
    links: AssociationStore<'a>,
}

impl<'a> TagManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            links: AssociationStore::new(conn),
        }
    }

    fn find_tag(&self, id: &str) -> Result<Option<Tag>, TagError> {
        let sql = format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.id = ?1");
        Ok(self.conn.query_row(&sql, params![id], row_to_tag).optional()?)
    }

    fn require_live_bookmark(&self, bookmark_id: &str) -> Result<(), TagError> {
        if !self.links.is_live_bookmark(bookmark_id)? {
            return Err(TagError::BookmarkNotFound(bookmark_id.to_string()));
        }
        Ok(())
    }

    /// Attaches one pair, recording the outcome in `result`.
    fn attach_one(&self, bookmark_id: &str, tag_id: &str, item_id: &str, result: &mut BatchResult) {
        let outcome = self
            .find_tag(tag_id)
            .and_then(|tag| tag.ok_or_else(|| TagError::NotFound(tag_id.to_string())))
            .and_then(|_| Ok(self.links.link_tag(bookmark_id, tag_id)?));

        match outcome {
            Ok(true) => result.applied += 1,
            Ok(false) => result.skipped += 1,
            Err(e) => {
                warn!(bookmark_id, tag_id, error = %e, "skipping tag attach");
                result.fail(item_id, e.kind(), e.to_string());
            }
        }
    }
}

impl<'a> TagManagerTrait for TagManager<'a> {
    /// Creates a new tag. Existing tags with the same name are left alone.
    fn create_tag(
        &mut self,
        user_id: &str,
        workspace_id: &str,
        name: &str,
        color: Option<&str>,
    ) -> Result<Tag, TagError> {
        let now = Utc::now().timestamp_millis();
        let tag = Tag {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            color: color.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO tags (id, user_id, workspace_id, name, color, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![tag.id, tag.user_id, tag.workspace_id, tag.name, tag.color, tag.created_at, tag.updated_at],
        )?;

        info!(tag_id = %tag.id, user_id, name, "created tag");
        Ok(tag)
    }

    fn get_tag(&self, id: &str) -> Result<Tag, TagError> {
        self.find_tag(id)?
            .ok_or_else(|| TagError::NotFound(id.to_string()))
    }

    /// Tags of a user ordered by name. Duplicated names are returned side by side.
    fn list_tags(&self, user_id: &str, workspace_id: Option<&str>) -> Result<Vec<Tag>, TagError> {
        let sql = format!(
            "SELECT {TAG_COLUMNS} FROM tags t
             WHERE t.user_id = ?1 AND (?2 IS NULL OR t.workspace_id = ?2)
             ORDER BY t.name ASC, t.rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, workspace_id], row_to_tag)?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    fn update_tag(&mut self, id: &str, update: TagUpdate) -> Result<Tag, TagError> {
        let mut tag = self.get_tag(id)?;
        if let Some(name) = update.name {
            tag.name = name;
        }
        if let Some(color) = update.color {
            tag.color = Some(color);
        }
        tag.updated_at = Utc::now().timestamp_millis();

        self.conn.execute(
            "UPDATE tags SET name = ?1, color = ?2, updated_at = ?3 WHERE id = ?4",
            params![tag.name, tag.color, tag.updated_at, tag.id],
        )?;
        Ok(tag)
    }

    /// Removes every association of the tag, then the tag itself.
    fn delete_tag(&mut self, id: &str) -> Result<(), TagError> {
        let tx = self.conn.unchecked_transaction()?;
        let unlinked = AssociationStore::new(&tx).unlink_tag_everywhere(id)?;
        let affected = tx.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(TagError::NotFound(id.to_string()));
        }
        tx.commit()?;

        info!(tag_id = id, unlinked, "deleted tag");
        Ok(())
    }

    /// Attaches each tag to one bookmark. An unknown bookmark fails the whole
    /// call; an unknown tag only fails its own item.
    fn attach_tags(&mut self, bookmark_id: &str, tag_ids: &[String]) -> Result<BatchResult, TagError> {
        self.require_live_bookmark(bookmark_id)?;

        let mut result = BatchResult::default();
        for tag_id in tag_ids {
            self.attach_one(bookmark_id, tag_id, tag_id, &mut result);
        }
        Ok(result)
    }

    /// Attaches one tag to many bookmarks. An unknown tag fails the whole call.
    fn bulk_attach(&mut self, bookmark_ids: &[String], tag_id: &str) -> Result<BatchResult, TagError> {
        self.get_tag(tag_id)?;

        let mut result = BatchResult::default();
        for bookmark_id in bookmark_ids {
            match self.links.is_live_bookmark(bookmark_id) {
                Ok(true) => self.attach_one(bookmark_id, tag_id, bookmark_id, &mut result),
                Ok(false) => {
                    let err = TagError::BookmarkNotFound(bookmark_id.clone());
                    warn!(bookmark_id = %bookmark_id, tag_id, "skipping tag attach: bookmark not found");
                    result.fail(bookmark_id, ErrorKind::NotFound, err.to_string());
                }
                Err(e) => {
                    warn!(bookmark_id = %bookmark_id, tag_id, error = %e, "skipping tag attach");
                    result.fail(bookmark_id, ErrorKind::StorageFailure, e.to_string());
                }
            }
        }
        info!(tag_id, applied = result.applied, failed = result.failures.len(), "bulk attached tag");
        Ok(result)
    }

    /// Swaps the bookmark's tag set in one transaction, so no reader sees it
    /// without tags. Every tag id must exist; otherwise nothing changes.
    fn replace_tags(&mut self, bookmark_id: &str, tag_ids: &[String]) -> Result<Vec<Tag>, TagError> {
        self.require_live_bookmark(bookmark_id)?;
        for tag_id in tag_ids {
            self.get_tag(tag_id)?;
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let links = AssociationStore::new(&tx);
            links.unlink_all_tags(bookmark_id)?;
            for tag_id in tag_ids {
                links.link_tag(bookmark_id, tag_id)?;
            }
        }
        tx.commit()?;

        self.list_tags_for_bookmark(bookmark_id)
    }

    fn detach_tag(&mut self, bookmark_id: &str, tag_id: &str) -> Result<(), TagError> {
        self.links.unlink_tag(bookmark_id, tag_id)?;
        Ok(())
    }

    /// Tags on a bookmark in attach order; empty for tombstoned bookmarks.
    fn list_tags_for_bookmark(&self, bookmark_id: &str) -> Result<Vec<Tag>, TagError> {
        Ok(self.links.tags_for_bookmark(bookmark_id)?)
    }

    /// Live bookmarks carrying the tag, newest first. Unknown tags are `NotFound`.
    fn list_bookmarks_for_tag(&self, tag_id: &str, page: PageRequest) -> Result<Page<Bookmark>, TagError> {
        self.get_tag(tag_id)?;
        let total = self.links.count_bookmarks_for_tag(tag_id)?;
        let items = self.links.bookmarks_for_tag(tag_id, page.limit(), page.offset())?;
        Ok(Page::new(items, total, page))
    }
}
