//! Query & Analytics Engine for MarkVault.
//!
//! Read-side views over every store: stats rollups, filtered search, duplicate
//! detection, export and the activity log. The write paths are `import`, a
//! best-effort loop that hands each item to the [`BookmarkStore`], and
//! `log_activity`.
//!
//! Every query is scoped to one user, optionally narrowed to one workspace,
//! and only sees live bookmarks.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::rows::{
    escape_like, row_to_bookmark, row_to_collection, row_to_folder, row_to_tag, BOOKMARK_COLUMNS,
    COLLECTION_COLUMNS, FOLDER_COLUMNS, LIVE_BOOKMARK, TAG_COLUMNS,
};
use crate::database::ActivityStore;
use crate::managers::bookmark_store::BookmarkStore;
use crate::types::activity::{BookmarkActivity, ACTION_IMPORTED};
use crate::types::analytics::{
    BookmarkStats, DuplicateCheck, ExportData, ImportItem, ImportResult, SearchParams,
};
use crate::types::bookmark::{Bookmark, BookmarkType, NewBookmark};
use crate::types::errors::AnalyticsError;
use crate::types::page::{Page, PageRequest};
use crate::types::settings::QuerySettings;

pub trait AnalyticsEngineTrait {
    fn stats(&self, user_id: &str, workspace_id: Option<&str>) -> Result<BookmarkStats, AnalyticsError>;
    fn search(&self, user_id: &str, params: &SearchParams) -> Result<Page<Bookmark>, AnalyticsError>;
    fn check_duplicate(
        &self,
        user_id: &str,
        target_id: &str,
        bookmark_type: BookmarkType,
    ) -> Result<DuplicateCheck, AnalyticsError>;
    fn recent_bookmarks(&self, user_id: &str, limit: u32) -> Result<Vec<Bookmark>, AnalyticsError>;
    fn export(&self, user_id: &str, workspace_id: Option<&str>) -> Result<ExportData, AnalyticsError>;
    fn import(
        &mut self,
        user_id: &str,
        workspace_id: &str,
        items: &[ImportItem],
        folder_id: Option<&str>,
    ) -> Result<ImportResult, AnalyticsError>;
    /// Appends an entry to a live bookmark's activity log.
    fn log_activity(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        action: &str,
        details: Option<&str>,
    ) -> Result<BookmarkActivity, AnalyticsError>;
    fn activity_for_user(&self, user_id: &str, page: PageRequest) -> Result<Page<BookmarkActivity>, AnalyticsError>;
    fn activity_for_bookmark(
        &self,
        bookmark_id: &str,
        page: PageRequest,
    ) -> Result<Page<BookmarkActivity>, AnalyticsError>;
}

pub struct AnalyticsEngine<'a, S: BookmarkStore> {
    conn: &'a Connection,
    store: &'a S,
    activity: ActivityStore<'a>,
    settings: QuerySettings,
}

impl<'a, S: BookmarkStore> AnalyticsEngine<'a, S> {
    pub fn new(conn: &'a Connection, store: &'a S, settings: QuerySettings) -> Self {
        Self {
            conn,
            store,
            activity: ActivityStore::new(conn),
            settings,
        }
    }

    /// Runs a `COUNT(*)`-style query bound to `(user_id, workspace_id)`.
    fn count_scoped(&self, sql: &str, user_id: &str, workspace_id: Option<&str>) -> Result<i64, AnalyticsError> {
        Ok(self.conn.query_row(sql, params![user_id, workspace_id], |row| row.get(0))?)
    }

    fn collect<T>(
        &self,
        sql: &str,
        bind: &[Value],
        map: fn(&rusqlite::Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, AnalyticsError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), map)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn import_one(
        &self,
        user_id: &str,
        workspace_id: &str,
        item: &ImportItem,
        folder_id: Option<&str>,
    ) -> Result<Bookmark, String> {
        let bookmark_type: BookmarkType = item.bookmark_type.parse()?;
        if item.title.trim().is_empty() {
            return Err("title is empty".to_string());
        }
        self.store
            .create(NewBookmark {
                user_id: user_id.to_string(),
                workspace_id: workspace_id.to_string(),
                folder_id: folder_id.map(str::to_string),
                bookmark_type,
                title: item.title.clone(),
                description: item.description.clone(),
                // Imported items have no target of their own.
                target_id: Uuid::new_v4().to_string(),
                target_url: item.target_url.clone(),
                metadata: item.metadata.clone(),
            })
            .map_err(|e| e.to_string())
    }
}

impl<'a, S: BookmarkStore> AnalyticsEngineTrait for AnalyticsEngine<'a, S> {
    /// Each figure is its own query over the same `(user, workspace?)` scope.
    fn stats(&self, user_id: &str, workspace_id: Option<&str>) -> Result<BookmarkStats, AnalyticsError> {
        let scope = "b.user_id = ?1 AND (?2 IS NULL OR b.workspace_id = ?2)";

        let total_bookmarks = self.count_scoped(
            &format!("SELECT COUNT(*) FROM bookmarks b WHERE {scope} AND {LIVE_BOOKMARK}"),
            user_id,
            workspace_id,
        )?;
        let total_folders = self.count_scoped(
            "SELECT COUNT(*) FROM bookmark_folders WHERE user_id = ?1 AND (?2 IS NULL OR workspace_id = ?2)",
            user_id,
            workspace_id,
        )?;
        let total_tags = self.count_scoped(
            "SELECT COUNT(*) FROM tags WHERE user_id = ?1 AND (?2 IS NULL OR workspace_id = ?2)",
            user_id,
            workspace_id,
        )?;
        let total_collections = self.count_scoped(
            "SELECT COUNT(*) FROM collections WHERE user_id = ?1 AND (?2 IS NULL OR workspace_id = ?2)",
            user_id,
            workspace_id,
        )?;

        let mut count_by_type: BTreeMap<BookmarkType, i64> =
            BookmarkType::ALL.iter().map(|t| (*t, 0)).collect();
        {
            let sql = format!(
                "SELECT b.type, COUNT(*) FROM bookmarks b WHERE {scope} AND {LIVE_BOOKMARK} GROUP BY b.type"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user_id, workspace_id], |row| {
                Ok((row.get::<_, BookmarkType>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (kind, count) = row?;
                count_by_type.insert(kind, count);
            }
        }

        let window = Duration::days(i64::from(self.settings.recent_window_days));
        let since = (Utc::now() - window).timestamp_millis();
        let recent_count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM bookmarks b WHERE {scope} AND {LIVE_BOOKMARK} AND b.created_at >= ?3"),
            params![user_id, workspace_id, since],
            |row| row.get(0),
        )?;

        let favorites_count = self.count_scoped(
            &format!(
                "SELECT COUNT(*) FROM favorites f JOIN bookmarks b ON b.id = f.bookmark_id
                 WHERE f.user_id = ?1 AND (?2 IS NULL OR b.workspace_id = ?2) AND {LIVE_BOOKMARK}"
            ),
            user_id,
            workspace_id,
        )?;

        Ok(BookmarkStats {
            total_bookmarks,
            total_folders,
            total_tags,
            total_collections,
            count_by_type,
            recent_count,
            favorites_count,
        })
    }

    /// `query` is a literal, case-insensitive substring of title or description.
    fn search(&self, user_id: &str, params: &SearchParams) -> Result<Page<Bookmark>, AnalyticsError> {
        let page = PageRequest::normalized(
            params.page,
            params.page_size,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );

        let mut clauses = vec!["b.user_id = ?".to_string(), LIVE_BOOKMARK.to_string()];
        let mut bind: Vec<Value> = vec![Value::Text(user_id.to_string())];

        if let Some(query) = params.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
            clauses.push(
                "(LOWER(b.title) LIKE ? ESCAPE '\\' OR LOWER(b.description) LIKE ? ESCAPE '\\')".to_string(),
            );
            bind.push(Value::Text(pattern.clone()));
            bind.push(Value::Text(pattern));
        }
        if let Some(kind) = params.bookmark_type {
            clauses.push("b.type = ?".to_string());
            bind.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(folder_id) = &params.folder_id {
            clauses.push("b.folder_id = ?".to_string());
            bind.push(Value::Text(folder_id.clone()));
        }
        let filter = clauses.join(" AND ");

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM bookmarks b WHERE {filter}"),
            params_from_iter(bind.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks b WHERE {filter} ORDER BY {} LIMIT ? OFFSET ?",
            params.sort.order_by()
        );
        bind.push(Value::Integer(page.limit()));
        bind.push(Value::Integer(page.offset()));
        let items = self.collect(&sql, &bind, row_to_bookmark)?;

        debug!(user_id, total, page = page.page, page_size = page.page_size, "search");
        Ok(Page::new(items, total, page))
    }

    /// Picks the earliest-created live match when several exist.
    fn check_duplicate(
        &self,
        user_id: &str,
        target_id: &str,
        bookmark_type: BookmarkType,
    ) -> Result<DuplicateCheck, AnalyticsError> {
        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks b
             WHERE b.user_id = ?1 AND b.target_id = ?2 AND b.type = ?3 AND {LIVE_BOOKMARK}
             ORDER BY b.created_at ASC, b.rowid ASC
             LIMIT 1"
        );
        let existing = self
            .conn
            .query_row(&sql, params![user_id, target_id, bookmark_type], row_to_bookmark)
            .optional()?;
        Ok(DuplicateCheck {
            is_duplicate: existing.is_some(),
            existing,
        })
    }

    fn recent_bookmarks(&self, user_id: &str, limit: u32) -> Result<Vec<Bookmark>, AnalyticsError> {
        let limit = PageRequest::normalized(0, Some(limit), self.settings.default_page_size, self.settings.max_page_size);
        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks b
             WHERE b.user_id = ? AND {LIVE_BOOKMARK}
             ORDER BY b.created_at DESC, b.rowid DESC
             LIMIT ?"
        );
        self.collect(
            &sql,
            &[Value::Text(user_id.to_string()), Value::Integer(limit.limit())],
            row_to_bookmark,
        )
    }

    /// Bookmarks are pulled through the store in `export_batch_size` chunks.
    fn export(&self, user_id: &str, workspace_id: Option<&str>) -> Result<ExportData, AnalyticsError> {
        let batch = i64::from(self.settings.export_batch_size.max(1));
        let mut bookmarks = Vec::new();
        let mut offset = 0;
        loop {
            let chunk = self.store.list_by_user(user_id, workspace_id, batch, offset)?;
            let fetched = chunk.len() as i64;
            bookmarks.extend(chunk);
            if fetched < batch {
                break;
            }
            offset += batch;
        }

        let bind = [
            Value::Text(user_id.to_string()),
            workspace_id.map_or(Value::Null, |w| Value::Text(w.to_string())),
        ];
        let folders = self.collect(
            &format!(
                "SELECT {FOLDER_COLUMNS} FROM bookmark_folders
                 WHERE user_id = ?1 AND (?2 IS NULL OR workspace_id = ?2) ORDER BY position, rowid"
            ),
            &bind,
            row_to_folder,
        )?;
        let tags = self.collect(
            &format!(
                "SELECT {TAG_COLUMNS} FROM tags t
                 WHERE t.user_id = ?1 AND (?2 IS NULL OR t.workspace_id = ?2) ORDER BY t.name, t.rowid"
            ),
            &bind,
            row_to_tag,
        )?;
        let collections = self.collect(
            &format!(
                "SELECT {COLLECTION_COLUMNS} FROM collections
                 WHERE user_id = ?1 AND (?2 IS NULL OR workspace_id = ?2) ORDER BY position, rowid"
            ),
            &bind,
            row_to_collection,
        )?;

        info!(user_id, bookmarks = bookmarks.len(), "exported bookmarks");
        Ok(ExportData {
            bookmarks,
            folders,
            tags,
            collections,
            exported_at: Utc::now(),
        })
    }

    /// Best effort: each item is created on its own and failures are
    /// collected as `"item N: <reason>"` with a zero-based `N`.
    fn import(
        &mut self,
        user_id: &str,
        workspace_id: &str,
        items: &[ImportItem],
        folder_id: Option<&str>,
    ) -> Result<ImportResult, AnalyticsError> {
        let mut result = ImportResult::default();
        for (index, item) in items.iter().enumerate() {
            match self.import_one(user_id, workspace_id, item, folder_id) {
                Ok(bookmark) => {
                    result.imported += 1;
                    if let Err(e) = self.activity.insert(&bookmark.id, user_id, ACTION_IMPORTED, None) {
                        warn!(user_id, bookmark_id = %bookmark.id, error = %e, "failed to log import activity");
                    }
                }
                Err(reason) => {
                    warn!(user_id, index, reason = %reason, "skipping import item");
                    result.failed += 1;
                    result.errors.push(format!("item {}: {}", index, reason));
                }
            }
        }

        info!(user_id, imported = result.imported, failed = result.failed, "imported bookmarks");
        Ok(result)
    }

    fn log_activity(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        action: &str,
        details: Option<&str>,
    ) -> Result<BookmarkActivity, AnalyticsError> {
        let action = action.trim();
        if action.is_empty() {
            return Err(AnalyticsError::InvalidArgument("activity action is empty".to_string()));
        }
        self.store.get(bookmark_id)?;
        let activity = self.activity.insert(bookmark_id, user_id, action, details)?;
        debug!(bookmark_id, user_id, action, "logged activity");
        Ok(activity)
    }

    /// Newest first; entries of tombstoned bookmarks are left out.
    fn activity_for_user(&self, user_id: &str, page: PageRequest) -> Result<Page<BookmarkActivity>, AnalyticsError> {
        let total = self.activity.count_for_user(user_id)?;
        let items = self.activity.list_for_user(user_id, page.limit(), page.offset())?;
        Ok(Page::new(items, total, page))
    }

    /// Newest first. A tombstoned bookmark yields an empty page.
    fn activity_for_bookmark(
        &self,
        bookmark_id: &str,
        page: PageRequest,
    ) -> Result<Page<BookmarkActivity>, AnalyticsError> {
        let total = self.activity.count_for_bookmark(bookmark_id)?;
        let items = self.activity.list_for_bookmark(bookmark_id, page.limit(), page.offset())?;
        Ok(Page::new(items, total, page))
    }
}
