//! Association Store for MarkVault.
//!
//! Persists the two link relations around a bookmark: the unordered
//! bookmark/tag pairs and the ordered bookmark/collection memberships. Pair
//! uniqueness is enforced by `UNIQUE` constraints, so linking an existing pair
//! is a no-op that reports `false`. Reads join `bookmarks b` and apply
//! [`LIVE_BOOKMARK`], so links owned by a tombstoned bookmark never surface.

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::rows::{row_to_bookmark, row_to_tag, BOOKMARK_COLUMNS, LIVE_BOOKMARK, TAG_COLUMNS};
use crate::types::bookmark::Bookmark;
use crate::types::collection::CollectionMembership;
use crate::types::tag::Tag;

pub struct AssociationStore<'a> {
    conn: &'a Connection,
}

impl<'a> AssociationStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// True when `bookmark_id` names a bookmark that has not been tombstoned.
    pub fn is_live_bookmark(&self, bookmark_id: &str) -> rusqlite::Result<bool> {
        let sql = format!("SELECT COUNT(*) FROM bookmarks b WHERE b.id = ?1 AND {LIVE_BOOKMARK}");
        let count: i64 = self.conn.query_row(&sql, params![bookmark_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    // ─── Tag links ───

    /// Links a tag to a bookmark. Returns `false` if the pair already existed.
    pub fn link_tag(&self, bookmark_id: &str, tag_id: &str) -> rusqlite::Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO bookmark_tags (id, bookmark_id, tag_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                bookmark_id,
                tag_id,
                Utc::now().timestamp_millis()
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Removes one pair. Returns `false` if it was not linked.
    pub fn unlink_tag(&self, bookmark_id: &str, tag_id: &str) -> rusqlite::Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM bookmark_tags WHERE bookmark_id = ?1 AND tag_id = ?2",
            params![bookmark_id, tag_id],
        )?;
        Ok(removed > 0)
    }

    pub fn unlink_all_tags(&self, bookmark_id: &str) -> rusqlite::Result<usize> {
        self.conn.execute(
            "DELETE FROM bookmark_tags WHERE bookmark_id = ?1",
            params![bookmark_id],
        )
    }

    /// Drops every link pointing at `tag_id`, across all bookmarks.
    pub fn unlink_tag_everywhere(&self, tag_id: &str) -> rusqlite::Result<usize> {
        self.conn
            .execute("DELETE FROM bookmark_tags WHERE tag_id = ?1", params![tag_id])
    }

    /// Tags on a live bookmark, in the order they were attached.
    pub fn tags_for_bookmark(&self, bookmark_id: &str) -> rusqlite::Result<Vec<Tag>> {
        let sql = format!(
            "SELECT {TAG_COLUMNS} FROM bookmark_tags bt
             JOIN tags t ON t.id = bt.tag_id
             JOIN bookmarks b ON b.id = bt.bookmark_id
             WHERE bt.bookmark_id = ?1 AND {LIVE_BOOKMARK}
             ORDER BY bt.rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![bookmark_id], row_to_tag)?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    /// Live bookmarks carrying `tag_id`, newest first.
    pub fn bookmarks_for_tag(
        &self,
        tag_id: &str,
        limit: i64,
        offset: i64,
    ) -> rusqlite::Result<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmark_tags bt
             JOIN bookmarks b ON b.id = bt.bookmark_id
             WHERE bt.tag_id = ?1 AND {LIVE_BOOKMARK}
             ORDER BY b.created_at DESC, b.rowid DESC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![tag_id, limit, offset], row_to_bookmark)?;
        let mut bookmarks = Vec::new();
        for row in rows {
            bookmarks.push(row?);
        }
        Ok(bookmarks)
    }

    pub fn count_bookmarks_for_tag(&self, tag_id: &str) -> rusqlite::Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM bookmark_tags bt
             JOIN bookmarks b ON b.id = bt.bookmark_id
             WHERE bt.tag_id = ?1 AND {LIVE_BOOKMARK}"
        );
        self.conn.query_row(&sql, params![tag_id], |row| row.get(0))
    }

    // ─── Collection memberships ───

    pub fn has_member(&self, collection_id: &str, bookmark_id: &str) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM collection_bookmarks WHERE collection_id = ?1 AND bookmark_id = ?2",
            params![collection_id, bookmark_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Position one past the current tail. Gaps left by removals are kept.
    pub fn next_member_position(&self, collection_id: &str) -> rusqlite::Result<i32> {
        self.conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM collection_bookmarks WHERE collection_id = ?1",
            params![collection_id],
            |row| row.get(0),
        )
    }

    /// Inserts a membership at `position`. Returns `false` if already a member.
    pub fn add_member(
        &self,
        collection_id: &str,
        bookmark_id: &str,
        position: i32,
    ) -> rusqlite::Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO collection_bookmarks (id, collection_id, bookmark_id, position, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                collection_id,
                bookmark_id,
                position,
                Utc::now().timestamp_millis()
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn remove_member(&self, collection_id: &str, bookmark_id: &str) -> rusqlite::Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM collection_bookmarks WHERE collection_id = ?1 AND bookmark_id = ?2",
            params![collection_id, bookmark_id],
        )?;
        Ok(removed > 0)
    }

    pub fn remove_all_members(&self, collection_id: &str) -> rusqlite::Result<usize> {
        self.conn.execute(
            "DELETE FROM collection_bookmarks WHERE collection_id = ?1",
            params![collection_id],
        )
    }

    /// Live members of a collection, by membership position.
    pub fn members(
        &self,
        collection_id: &str,
        limit: i64,
        offset: i64,
    ) -> rusqlite::Result<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS} FROM collection_bookmarks cb
             JOIN bookmarks b ON b.id = cb.bookmark_id
             WHERE cb.collection_id = ?1 AND {LIVE_BOOKMARK}
             ORDER BY cb.position ASC, cb.rowid ASC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![collection_id, limit, offset], row_to_bookmark)?;
        let mut bookmarks = Vec::new();
        for row in rows {
            bookmarks.push(row?);
        }
        Ok(bookmarks)
    }

    /// Raw membership rows of live members, by position.
    pub fn memberships(&self, collection_id: &str) -> rusqlite::Result<Vec<CollectionMembership>> {
        let sql = format!(
            "SELECT cb.id, cb.collection_id, cb.bookmark_id, cb.position, cb.created_at
             FROM collection_bookmarks cb
             JOIN bookmarks b ON b.id = cb.bookmark_id
             WHERE cb.collection_id = ?1 AND {LIVE_BOOKMARK}
             ORDER BY cb.position ASC, cb.rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![collection_id], |row| {
            Ok(CollectionMembership {
                id: row.get(0)?,
                collection_id: row.get(1)?,
                bookmark_id: row.get(2)?,
                position: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        let mut memberships = Vec::new();
        for row in rows {
            memberships.push(row?);
        }
        Ok(memberships)
    }

    pub fn count_members(&self, collection_id: &str) -> rusqlite::Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM collection_bookmarks cb
             JOIN bookmarks b ON b.id = cb.bookmark_id
             WHERE cb.collection_id = ?1 AND {LIVE_BOOKMARK}"
        );
        self.conn.query_row(&sql, params![collection_id], |row| row.get(0))
    }
}
