//! RPC method handler for the MarkVault JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches one call to the managers built from `App`.
//! Params and results use the camelCase field names of the serde types.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::App;
use crate::managers::bookmark_store::BookmarkStore;
use crate::managers::collection_manager::CollectionManagerTrait;
use crate::managers::favorite_manager::FavoriteManagerTrait;
use crate::managers::schedule_manager::ScheduleManagerTrait;
use crate::managers::sharing_manager::{SharingManager, SharingManagerTrait};
use crate::managers::tag_manager::TagManagerTrait;
use crate::managers::version_manager::{VersionManager, VersionManagerTrait};
use crate::services::analytics_engine::{AnalyticsEngine, AnalyticsEngineTrait};
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::analytics::{ImportItem, SearchParams};
use crate::types::bookmark::{BookmarkType, NewBookmark};
use crate::types::collection::{CollectionUpdate, NewCollection};
use crate::types::errors::{Classify, ErrorKind};
use crate::types::page::PageRequest;
use crate::types::tag::TagUpdate;

/// Error payload returned to RPC callers as `{"code": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: ErrorKind,
    pub message: String,
}

impl RpcError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ErrorKind::InvalidArgument,
            message: message.into(),
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl<E: Classify + fmt::Display> From<E> for RpcError {
    fn from(err: E) -> Self {
        Self {
            code: err.kind(),
            message: err.to_string(),
        }
    }
}

type RpcResult = Result<Value, RpcError>;

fn lock(app: &Mutex<App>) -> Result<MutexGuard<'_, App>, RpcError> {
    app.lock().map_err(|e| RpcError {
        code: ErrorKind::StorageFailure,
        message: e.to_string(),
    })
}

fn str_param<'p>(params: &'p Value, name: &str) -> Result<&'p str, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid(format!("missing {}", name)))
}

fn opt_str_param<'p>(params: &'p Value, name: &str) -> Option<&'p str> {
    params.get(name).and_then(|v| v.as_str())
}

fn i64_param(params: &Value, name: &str) -> Result<i64, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid(format!("missing {}", name)))
}

fn string_list(params: &Value, name: &str) -> Result<Vec<String>, RpcError> {
    let value = params
        .get(name)
        .cloned()
        .ok_or_else(|| RpcError::invalid(format!("missing {}", name)))?;
    serde_json::from_value(value).map_err(|e| RpcError::invalid(format!("invalid {}: {}", name, e)))
}

/// Deserializes the whole params object, or the member `name` when given.
fn decode<T: DeserializeOwned>(params: &Value, name: Option<&str>) -> Result<T, RpcError> {
    let value = match name {
        Some(n) => params
            .get(n)
            .cloned()
            .ok_or_else(|| RpcError::invalid(format!("missing {}", n)))?,
        None => params.clone(),
    };
    serde_json::from_value(value).map_err(|e| RpcError::invalid(format!("invalid params: {}", e)))
}

fn page_param(app: &App, params: &Value) -> PageRequest {
    let query = app.query_settings();
    let page = params.get("page").and_then(|v| v.as_u64()).unwrap_or(0);
    let size = params.get("pageSize").and_then(|v| v.as_u64());
    PageRequest::normalized(
        u32::try_from(page).unwrap_or(u32::MAX),
        size.map(|s| u32::try_from(s).unwrap_or(u32::MAX)),
        query.default_page_size,
        query.max_page_size,
    )
}

fn to_json<T: Serialize>(value: T) -> RpcResult {
    serde_json::to_value(value).map_err(|e| RpcError {
        code: ErrorKind::StorageFailure,
        message: e.to_string(),
    })
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> RpcResult {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Bookmarks ───
        "bookmark.create" => {
            let new: NewBookmark = decode(params, None)?;
            let a = lock(app)?;
            to_json(a.bookmarks().create(new)?)
        }
        "bookmark.get" => {
            let id = str_param(params, "id")?;
            let a = lock(app)?;
            to_json(a.bookmarks().get(id)?)
        }
        "bookmark.update" => {
            let id = str_param(params, "id")?;
            let a = lock(app)?;
            let store = a.bookmarks();
            let mut bookmark = store.get(id)?;
            if let Some(title) = opt_str_param(params, "title") {
                bookmark.title = title.to_string();
            }
            if let Some(description) = opt_str_param(params, "description") {
                bookmark.description = description.to_string();
            }
            if let Some(url) = params.get("targetUrl") {
                bookmark.target_url = url.as_str().map(str::to_string);
            }
            if let Some(metadata) = params.get("metadata") {
                bookmark.metadata = metadata.as_str().map(str::to_string);
            }
            if let Some(folder) = params.get("folderId") {
                bookmark.folder_id = folder.as_str().map(str::to_string);
            }
            to_json(store.update(&bookmark)?)
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            let a = lock(app)?;
            a.bookmarks().soft_delete(id)?;
            Ok(json!({"ok": true}))
        }
        "bookmark.list" => {
            let user_id = str_param(params, "userId")?;
            let a = lock(app)?;
            let page = page_param(&a, params);
            let items = a.bookmarks().list_by_user(
                user_id,
                opt_str_param(params, "workspaceId"),
                page.limit(),
                page.offset(),
            )?;
            to_json(items)
        }
        "folder.create" => {
            let a = lock(app)?;
            let folder = a.bookmarks().create_folder(
                str_param(params, "userId")?,
                str_param(params, "workspaceId")?,
                str_param(params, "name")?,
                opt_str_param(params, "parentId"),
            )?;
            to_json(folder)
        }
        "folder.list" => {
            let a = lock(app)?;
            let folders = a
                .bookmarks()
                .list_folders(str_param(params, "userId")?, opt_str_param(params, "workspaceId"))?;
            to_json(folders)
        }

        // ─── Tags ───
        "tag.create" => {
            let a = lock(app)?;
            let tag = a.tags().create_tag(
                str_param(params, "userId")?,
                str_param(params, "workspaceId")?,
                str_param(params, "name")?,
                opt_str_param(params, "color"),
            )?;
            to_json(tag)
        }
        "tag.get" => {
            let a = lock(app)?;
            to_json(a.tags().get_tag(str_param(params, "id")?)?)
        }
        "tag.list" => {
            let a = lock(app)?;
            let tags = a
                .tags()
                .list_tags(str_param(params, "userId")?, opt_str_param(params, "workspaceId"))?;
            to_json(tags)
        }
        "tag.update" => {
            let id = str_param(params, "id")?;
            let update: TagUpdate = decode(params, None)?;
            let a = lock(app)?;
            to_json(a.tags().update_tag(id, update)?)
        }
        "tag.delete" => {
            let a = lock(app)?;
            a.tags().delete_tag(str_param(params, "id")?)?;
            Ok(json!({"ok": true}))
        }
        "tag.attach" => {
            let bookmark_id = str_param(params, "bookmarkId")?;
            let tag_ids = string_list(params, "tagIds")?;
            let a = lock(app)?;
            to_json(a.tags().attach_tags(bookmark_id, &tag_ids)?)
        }
        "tag.bulk_attach" => {
            let tag_id = str_param(params, "tagId")?;
            let bookmark_ids = string_list(params, "bookmarkIds")?;
            let a = lock(app)?;
            to_json(a.tags().bulk_attach(&bookmark_ids, tag_id)?)
        }
        "tag.replace" => {
            let bookmark_id = str_param(params, "bookmarkId")?;
            let tag_ids = string_list(params, "tagIds")?;
            let a = lock(app)?;
            to_json(a.tags().replace_tags(bookmark_id, &tag_ids)?)
        }
        "tag.detach" => {
            let a = lock(app)?;
            a.tags()
                .detach_tag(str_param(params, "bookmarkId")?, str_param(params, "tagId")?)?;
            Ok(json!({"ok": true}))
        }
        "tag.for_bookmark" => {
            let a = lock(app)?;
            to_json(a.tags().list_tags_for_bookmark(str_param(params, "bookmarkId")?)?)
        }
        "tag.bookmarks" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            to_json(a.tags().list_bookmarks_for_tag(str_param(params, "tagId")?, page)?)
        }

        // ─── Collections ───
        "collection.create" => {
            let new: NewCollection = decode(params, None)?;
            let a = lock(app)?;
            to_json(a.collections().create_collection(new)?)
        }
        "collection.get" => {
            let a = lock(app)?;
            to_json(a.collections().get_collection(str_param(params, "id")?)?)
        }
        "collection.update" => {
            let id = str_param(params, "id")?;
            let update: CollectionUpdate = decode(params, None)?;
            let a = lock(app)?;
            to_json(a.collections().update_collection(id, update)?)
        }
        "collection.delete" => {
            let a = lock(app)?;
            a.collections().delete_collection(str_param(params, "id")?)?;
            Ok(json!({"ok": true}))
        }
        "collection.list" => {
            let a = lock(app)?;
            let collections = a
                .collections()
                .list_collections(str_param(params, "userId")?, opt_str_param(params, "workspaceId"))?;
            to_json(collections)
        }
        "collection.public" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            to_json(a.collections().list_public_by_workspace(str_param(params, "workspaceId")?, page)?)
        }
        "collection.add" => {
            let collection_id = str_param(params, "collectionId")?;
            let bookmark_ids = string_list(params, "bookmarkIds")?;
            let a = lock(app)?;
            to_json(a.collections().add_bookmarks(collection_id, &bookmark_ids)?)
        }
        "collection.remove" => {
            let a = lock(app)?;
            a.collections()
                .remove_bookmark(str_param(params, "collectionId")?, str_param(params, "bookmarkId")?)?;
            Ok(json!({"ok": true}))
        }
        "collection.bookmarks" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            to_json(a.collections().list_bookmarks(str_param(params, "collectionId")?, page)?)
        }
        "collection.count" => {
            let a = lock(app)?;
            let count = a.collections().count_bookmarks(str_param(params, "collectionId")?)?;
            Ok(json!({"count": count}))
        }

        // ─── Versions ───
        "version.snapshot" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let mut versions = VersionManager::new(a.db.connection(), &store);
            let version = versions.snapshot_by_id(
                str_param(params, "bookmarkId")?,
                str_param(params, "userId")?,
                opt_str_param(params, "changeNote"),
            )?;
            to_json(version)
        }
        "version.restore" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let mut versions = VersionManager::new(a.db.connection(), &store);
            let bookmark = versions
                .restore(str_param(params, "bookmarkId")?, str_param(params, "versionId")?)?;
            to_json(bookmark)
        }
        "version.get" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let versions = VersionManager::new(a.db.connection(), &store);
            to_json(versions.get_version(str_param(params, "id")?)?)
        }
        "version.list" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            let store = a.bookmarks();
            let versions = VersionManager::new(a.db.connection(), &store);
            to_json(versions.list_versions(str_param(params, "bookmarkId")?, page)?)
        }

        // ─── Analytics ───
        "analytics.stats" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            to_json(engine.stats(str_param(params, "userId")?, opt_str_param(params, "workspaceId"))?)
        }
        "analytics.search" => {
            let user_id = str_param(params, "userId")?;
            let search: SearchParams = decode(params, None)?;
            let a = lock(app)?;
            let store = a.bookmarks();
            let engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            to_json(engine.search(user_id, &search)?)
        }
        "analytics.duplicate" => {
            let bookmark_type: BookmarkType = decode(params, Some("type"))?;
            let a = lock(app)?;
            let store = a.bookmarks();
            let engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            let check = engine.check_duplicate(
                str_param(params, "userId")?,
                str_param(params, "targetId")?,
                bookmark_type,
            )?;
            to_json(check)
        }
        "analytics.recent" => {
            let limit = params.get("limit").and_then(|v| v.as_u64()).unwrap_or(0);
            let a = lock(app)?;
            let store = a.bookmarks();
            let engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            let items = engine.recent_bookmarks(
                str_param(params, "userId")?,
                u32::try_from(limit).unwrap_or(u32::MAX),
            )?;
            to_json(items)
        }
        "analytics.export" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            to_json(engine.export(str_param(params, "userId")?, opt_str_param(params, "workspaceId"))?)
        }
        "analytics.import" => {
            let items: Vec<ImportItem> = decode(params, Some("bookmarks"))?;
            let a = lock(app)?;
            let store = a.bookmarks();
            let mut engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            let result = engine.import(
                str_param(params, "userId")?,
                str_param(params, "workspaceId")?,
                &items,
                opt_str_param(params, "folderId"),
            )?;
            to_json(result)
        }

        "activity.log" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let mut engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            let activity = engine.log_activity(
                str_param(params, "bookmarkId")?,
                str_param(params, "userId")?,
                str_param(params, "action")?,
                opt_str_param(params, "details"),
            )?;
            to_json(activity)
        }
        "activity.user" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            let store = a.bookmarks();
            let engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            to_json(engine.activity_for_user(str_param(params, "userId")?, page)?)
        }
        "activity.bookmark" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            let store = a.bookmarks();
            let engine = AnalyticsEngine::new(a.db.connection(), &store, a.query_settings());
            to_json(engine.activity_for_bookmark(str_param(params, "bookmarkId")?, page)?)
        }

        // ─── Sharing ───
        "share.create" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let mut sharing = SharingManager::new(a.db.connection(), &store);
            let share = sharing.share(
                str_param(params, "bookmarkId")?,
                str_param(params, "sharedBy")?,
                str_param(params, "sharedWith")?,
                opt_str_param(params, "message"),
            )?;
            to_json(share)
        }
        "share.accept" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let mut sharing = SharingManager::new(a.db.connection(), &store);
            to_json(sharing.accept(str_param(params, "id")?)?)
        }
        "share.decline" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let mut sharing = SharingManager::new(a.db.connection(), &store);
            sharing.decline(str_param(params, "id")?)?;
            Ok(json!({"ok": true}))
        }
        "share.received" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            let store = a.bookmarks();
            let sharing = SharingManager::new(a.db.connection(), &store);
            to_json(sharing.shared_with(str_param(params, "userId")?, page)?)
        }
        "share.sent" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            let store = a.bookmarks();
            let sharing = SharingManager::new(a.db.connection(), &store);
            to_json(sharing.shared_by(str_param(params, "userId")?, page)?)
        }
        "share.pending" => {
            let a = lock(app)?;
            let store = a.bookmarks();
            let sharing = SharingManager::new(a.db.connection(), &store);
            let count = sharing.pending_count(str_param(params, "userId")?)?;
            Ok(json!({"count": count}))
        }

        // ─── Favorites ───
        "favorite.add" => {
            let a = lock(app)?;
            let added = a
                .favorites()
                .add(str_param(params, "userId")?, str_param(params, "bookmarkId")?)?;
            Ok(json!({"added": added}))
        }
        "favorite.remove" => {
            let a = lock(app)?;
            let removed = a
                .favorites()
                .remove(str_param(params, "userId")?, str_param(params, "bookmarkId")?)?;
            Ok(json!({"removed": removed}))
        }
        "favorite.check" => {
            let a = lock(app)?;
            let favorite = a
                .favorites()
                .is_favorite(str_param(params, "userId")?, str_param(params, "bookmarkId")?)?;
            Ok(json!({"isFavorite": favorite}))
        }
        "favorite.list" => {
            let a = lock(app)?;
            let page = page_param(&a, params);
            to_json(a.favorites().list(str_param(params, "userId")?, page)?)
        }

        // ─── Timer hooks ───
        "reminder.create" => {
            let a = lock(app)?;
            let reminder = a.schedules().create_reminder(
                str_param(params, "bookmarkId")?,
                str_param(params, "userId")?,
                i64_param(params, "remindAt")?,
                opt_str_param(params, "message"),
            )?;
            to_json(reminder)
        }
        "reminder.due" => {
            let a = lock(app)?;
            to_json(a.schedules().due_reminders(i64_param(params, "before")?)?)
        }
        "reminder.fire" => {
            let a = lock(app)?;
            to_json(a.schedules().mark_fired(str_param(params, "id")?)?)
        }
        "reminder.cancel" => {
            let a = lock(app)?;
            let cancelled = a.schedules().cancel_for_bookmark(str_param(params, "bookmarkId")?)?;
            Ok(json!({"cancelled": cancelled}))
        }
        "expiration.set" => {
            let a = lock(app)?;
            let expiration = a.schedules().set_expiration(
                str_param(params, "bookmarkId")?,
                str_param(params, "userId")?,
                i64_param(params, "expiresAt")?,
                opt_str_param(params, "action"),
            )?;
            to_json(expiration)
        }
        "expiration.get" => {
            let a = lock(app)?;
            to_json(a.schedules().get_expiration(str_param(params, "bookmarkId")?)?)
        }
        "expiration.due" => {
            let a = lock(app)?;
            let due = a
                .schedules()
                .expiring(str_param(params, "userId")?, i64_param(params, "before")?)?;
            to_json(due)
        }
        "expiration.expire" => {
            let a = lock(app)?;
            a.schedules().mark_expired(str_param(params, "id")?)?;
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = lock(app)?;
            to_json(a.settings_engine.get_settings())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params
                .get("value")
                .cloned()
                .ok_or_else(|| RpcError::invalid("missing value"))?;
            let mut a = lock(app)?;
            a.settings_engine.set_value(key, value)?;
            Ok(json!({"ok": true}))
        }

        _ => Err(RpcError::invalid(format!("unknown method: {}", method))),
    }
}
