//! Unit tests for the AnalyticsEngine: stats, search, duplicates, export,
//! import and the activity log.

use rstest::rstest;

use markvault::database::Database;
use markvault::managers::bookmark_store::{BookmarkStore, SqliteBookmarkStore};
use markvault::managers::collection_manager::{CollectionManager, CollectionManagerTrait};
use markvault::managers::favorite_manager::{FavoriteManager, FavoriteManagerTrait};
use markvault::managers::tag_manager::{TagManager, TagManagerTrait};
use markvault::services::analytics_engine::{AnalyticsEngine, AnalyticsEngineTrait};
use markvault::types::analytics::{ImportItem, SearchParams, SortOrder};
use markvault::types::bookmark::{Bookmark, BookmarkType, NewBookmark};
use markvault::types::collection::NewCollection;
use markvault::types::page::PageRequest;
use markvault::types::errors::{AnalyticsError, Classify, ErrorKind};
use markvault::types::settings::QuerySettings;

fn setup() -> (Database, ()) {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    (db, ())
}

fn add(
    store: &SqliteBookmarkStore<'_>,
    workspace: &str,
    kind: BookmarkType,
    title: &str,
    description: &str,
) -> Bookmark {
    store
        .create(NewBookmark {
            user_id: "u1".into(),
            workspace_id: workspace.into(),
            folder_id: None,
            bookmark_type: kind,
            title: title.into(),
            description: description.into(),
            target_id: format!("t-{}", title),
            target_url: None,
            metadata: None,
        })
        .unwrap()
}

fn titles(bookmarks: &[Bookmark]) -> Vec<String> {
    bookmarks.iter().map(|b| b.title.clone()).collect()
}

#[test]
fn test_stats_counts_and_zero_filled_types() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let m1 = add(&store, "w1", BookmarkType::Message, "m1", "");
    add(&store, "w1", BookmarkType::Message, "m2", "");
    add(&store, "w1", BookmarkType::File, "f1", "");
    let other_ws = add(&store, "w2", BookmarkType::Thread, "t1", "");
    let dead = add(&store, "w1", BookmarkType::Channel, "gone", "");
    store.soft_delete(&dead.id).unwrap();

    store.create_folder("u1", "w1", "Folder", None).unwrap();
    TagManager::new(db.connection()).create_tag("u1", "w1", "tag", None).unwrap();
    CollectionManager::new(db.connection())
        .create_collection(NewCollection {
            user_id: "u1".into(),
            workspace_id: "w1".into(),
            name: "c".into(),
            ..Default::default()
        })
        .unwrap();
    let mut favorites = FavoriteManager::new(db.connection());
    favorites.add("u1", &m1.id).unwrap();
    favorites.add("u1", &other_ws.id).unwrap();

    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let scoped = engine.stats("u1", Some("w1")).unwrap();
    assert_eq!(scoped.total_bookmarks, 3);
    assert_eq!(scoped.total_folders, 1);
    assert_eq!(scoped.total_tags, 1);
    assert_eq!(scoped.total_collections, 1);
    assert_eq!(scoped.recent_count, 3);
    assert_eq!(scoped.favorites_count, 1);
    assert_eq!(scoped.count_by_type.len(), BookmarkType::ALL.len());
    assert_eq!(scoped.count_by_type[&BookmarkType::Message], 2);
    assert_eq!(scoped.count_by_type[&BookmarkType::File], 1);
    assert_eq!(scoped.count_by_type[&BookmarkType::Channel], 0);
    assert_eq!(scoped.count_by_type[&BookmarkType::External], 0);

    let all = engine.stats("u1", None).unwrap();
    assert_eq!(all.total_bookmarks, 4);
    assert_eq!(all.favorites_count, 2);
    assert_eq!(all.count_by_type[&BookmarkType::Thread], 1);
}

/// Bookmarks older than the recent window are not counted as recent.
#[test]
fn test_stats_recent_window() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let old = add(&store, "w1", BookmarkType::Message, "old", "");
    add(&store, "w1", BookmarkType::Message, "new", "");
    let thirty_days = 30 * 24 * 60 * 60 * 1000_i64;
    db.connection()
        .execute(
            "UPDATE bookmarks SET created_at = created_at - ?1 WHERE id = ?2",
            rusqlite::params![thirty_days, old.id],
        )
        .unwrap();

    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());
    let stats = engine.stats("u1", None).unwrap();

    assert_eq!(stats.total_bookmarks, 2);
    assert_eq!(stats.recent_count, 1);
}

#[test]
fn test_stats_for_unknown_user_is_zero() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let stats = engine.stats("nobody", None).unwrap();

    assert_eq!(stats.total_bookmarks, 0);
    assert!(stats.count_by_type.values().all(|c| *c == 0));
}

#[test]
fn test_search_matches_title_or_description_case_insensitively() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    add(&store, "w1", BookmarkType::Message, "Quarterly REPORT", "");
    add(&store, "w1", BookmarkType::File, "Notes", "contains the report link");
    add(&store, "w1", BookmarkType::File, "Unrelated", "nothing here");
    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let page = engine
        .search(
            "u1",
            &SearchParams {
                query: Some("report".into()),
                sort: SortOrder::Title,
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(titles(&page.items), vec!["Notes", "Quarterly REPORT"]);
}

/// `%` and `_` in a query match literally.
#[rstest]
#[case("100%", vec!["100% done"])]
#[case("a_b", vec!["a_b"])]
#[case("%", vec!["100% done"])]
fn test_search_escapes_wildcards(#[case] query: &str, #[case] expected: Vec<&str>) {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    add(&store, "w1", BookmarkType::Message, "100% done", "");
    add(&store, "w1", BookmarkType::Message, "1000 done", "");
    add(&store, "w1", BookmarkType::Message, "a_b", "");
    add(&store, "w1", BookmarkType::Message, "axb", "");
    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let page = engine
        .search("u1", &SearchParams { query: Some(query.into()), ..Default::default() })
        .unwrap();

    assert_eq!(titles(&page.items), expected);
}

#[rstest]
#[case(SortOrder::Newest, vec!["c", "a", "b"])]
#[case(SortOrder::Oldest, vec!["b", "a", "c"])]
#[case(SortOrder::Title, vec!["a", "b", "c"])]
#[case(SortOrder::Position, vec!["b", "a", "c"])]
fn test_search_sort_orders(#[case] sort: SortOrder, #[case] expected: Vec<&str>) {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    for title in ["b", "a", "c"] {
        add(&store, "w1", BookmarkType::Message, title, "");
    }
    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let page = engine.search("u1", &SearchParams { sort, ..Default::default() }).unwrap();

    assert_eq!(titles(&page.items), expected);
}

#[test]
fn test_search_filters_by_type_and_folder() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let folder = store.create_folder("u1", "w1", "Inbox", None).unwrap();
    let mut in_folder = NewBookmark {
        user_id: "u1".into(),
        workspace_id: "w1".into(),
        folder_id: Some(folder.id.clone()),
        bookmark_type: BookmarkType::File,
        title: "filed".into(),
        description: String::new(),
        target_id: "f".into(),
        target_url: None,
        metadata: None,
    };
    store.create(in_folder.clone()).unwrap();
    in_folder.bookmark_type = BookmarkType::Message;
    in_folder.title = "filed message".into();
    store.create(in_folder).unwrap();
    add(&store, "w1", BookmarkType::File, "loose", "");
    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let page = engine
        .search(
            "u1",
            &SearchParams {
                bookmark_type: Some(BookmarkType::File),
                folder_id: Some(folder.id),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(titles(&page.items), vec!["filed"]);
}

#[test]
fn test_search_skips_other_users_and_tombstones() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let dead = add(&store, "w1", BookmarkType::Message, "match dead", "");
    add(&store, "w1", BookmarkType::Message, "match live", "");
    store
        .create(NewBookmark {
            user_id: "u2".into(),
            workspace_id: "w1".into(),
            folder_id: None,
            bookmark_type: BookmarkType::Message,
            title: "match theirs".into(),
            description: String::new(),
            target_id: "x".into(),
            target_url: None,
            metadata: None,
        })
        .unwrap();
    store.soft_delete(&dead.id).unwrap();
    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let page = engine
        .search("u1", &SearchParams { query: Some("match".into()), ..Default::default() })
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(titles(&page.items), vec!["match live"]);
}

/// The earliest live bookmark with the same target and type is reported.
#[test]
fn test_check_duplicate_returns_earliest() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let mut new = NewBookmark {
        user_id: "u1".into(),
        workspace_id: "w1".into(),
        folder_id: None,
        bookmark_type: BookmarkType::Channel,
        title: "first".into(),
        description: String::new(),
        target_id: "C123".into(),
        target_url: None,
        metadata: None,
    };
    let first = store.create(new.clone()).unwrap();
    new.title = "second".into();
    store.create(new).unwrap();
    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let dup = engine.check_duplicate("u1", "C123", BookmarkType::Channel).unwrap();
    assert!(dup.is_duplicate);
    assert_eq!(dup.existing.map(|b| b.id), Some(first.id.clone()));

    let other_type = engine.check_duplicate("u1", "C123", BookmarkType::Message).unwrap();
    assert!(!other_type.is_duplicate);
    assert!(other_type.existing.is_none());

    store.soft_delete(&first.id).unwrap();
    let after = engine.check_duplicate("u1", "C123", BookmarkType::Channel).unwrap();
    assert_eq!(after.existing.map(|b| b.title), Some("second".to_string()));
}

#[test]
fn test_recent_bookmarks_newest_first() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    for title in ["one", "two", "three"] {
        add(&store, "w1", BookmarkType::Message, title, "");
    }
    let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    assert_eq!(titles(&engine.recent_bookmarks("u1", 2).unwrap()), vec!["three", "two"]);
    assert_eq!(engine.recent_bookmarks("u1", 0).unwrap().len(), 3);
}

/// Export walks every batch, including a final partial one.
#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
fn test_export_collects_all_batches(#[case] batch: u32) {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    for i in 0..4 {
        add(&store, "w1", BookmarkType::Message, &format!("b{}", i), "");
    }
    add(&store, "w2", BookmarkType::Message, "elsewhere", "");
    store.create_folder("u1", "w1", "F", None).unwrap();
    TagManager::new(db.connection()).create_tag("u1", "w1", "t", None).unwrap();
    let settings = QuerySettings { export_batch_size: batch, ..QuerySettings::default() };
    let engine = AnalyticsEngine::new(db.connection(), &store, settings);

    let data = engine.export("u1", Some("w1")).unwrap();

    assert_eq!(titles(&data.bookmarks), vec!["b0", "b1", "b2", "b3"]);
    assert_eq!(data.folders.len(), 1);
    assert_eq!(data.tags.len(), 1);
    assert!(data.collections.is_empty());
    assert_eq!(engine.export("u1", None).unwrap().bookmarks.len(), 5);
}

#[test]
fn test_import_collects_per_item_errors() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let mut engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());
    let items = vec![
        ImportItem {
            bookmark_type: "external".into(),
            title: "Docs".into(),
            target_url: Some("https://docs.example.com".into()),
            ..Default::default()
        },
        ImportItem {
            bookmark_type: "bogus".into(),
            title: "Bad type".into(),
            ..Default::default()
        },
        ImportItem {
            bookmark_type: "file".into(),
            title: "   ".into(),
            ..Default::default()
        },
        ImportItem {
            bookmark_type: "message".into(),
            title: "Fine".into(),
            ..Default::default()
        },
    ];

    let result = engine.import("u1", "w1", &items, None).unwrap();

    assert_eq!(result.imported, 2);
    assert_eq!(result.failed, 2);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].starts_with("item 1: "));
    assert!(result.errors[1].starts_with("item 2: "));
    assert_eq!(store.list_by_user("u1", None, 10, 0).unwrap().len(), 2);

    let log = engine.activity_for_user("u1", PageRequest::default()).unwrap();
    assert_eq!(log.total, 2);
    assert!(log.items.iter().all(|a| a.action == "imported"));
}

#[test]
fn test_import_into_missing_folder_fails_each_item() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let mut engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());
    let items = vec![ImportItem {
        bookmark_type: "message".into(),
        title: "orphan".into(),
        ..Default::default()
    }];

    let result = engine.import("u1", "w1", &items, Some("no-folder")).unwrap();

    assert_eq!(result.imported, 0);
    assert_eq!(result.failed, 1);
    assert!(result.errors[0].contains("no-folder"));
}

#[test]
fn test_analytics_error_from_store_error() {
    let err: AnalyticsError = markvault::types::errors::StoreError::FolderNotFound("f".into()).into();
    assert!(matches!(err, AnalyticsError::FolderNotFound(_)));
}

/// A store NotFound keeps its kind when it surfaces through the engine.
#[test]
fn test_analytics_error_keeps_not_found_kind() {
    let err: AnalyticsError = markvault::types::errors::StoreError::NotFound("b".into()).into();
    assert!(matches!(err, AnalyticsError::NotFound(ref id) if id == "b"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_activity_newest_first_with_paging() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let first = add(&store, "w1", BookmarkType::Message, "first", "");
    let second = add(&store, "w1", BookmarkType::Message, "second", "");
    let mut engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    engine.log_activity(&first.id, "u1", "viewed", None).unwrap();
    engine.log_activity(&second.id, "u1", "viewed", None).unwrap();
    let edited = engine.log_activity(&first.id, "u1", "edited", Some("title")).unwrap();
    engine.log_activity(&first.id, "u2", "viewed", None).unwrap();

    let page = engine.activity_for_user("u1", PageRequest::new(0, Some(2))).unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0], edited);
    assert_eq!(page.items[1].bookmark_id, second.id);

    let page = engine.activity_for_bookmark(&first.id, PageRequest::default()).unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(
        page.items.iter().map(|a| a.action.as_str()).collect::<Vec<_>>(),
        vec!["viewed", "edited", "viewed"]
    );
    assert_eq!(page.items[0].user_id, "u2");
}

#[test]
fn test_activity_of_tombstoned_bookmark_is_hidden() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let kept = add(&store, "w1", BookmarkType::File, "kept", "");
    let gone = add(&store, "w1", BookmarkType::File, "gone", "");
    let mut engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());
    engine.log_activity(&kept.id, "u1", "viewed", None).unwrap();
    engine.log_activity(&gone.id, "u1", "viewed", None).unwrap();

    store.soft_delete(&gone.id).unwrap();

    let page = engine.activity_for_user("u1", PageRequest::default()).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].bookmark_id, kept.id);
    let page = engine.activity_for_bookmark(&gone.id, PageRequest::default()).unwrap();
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
    assert!(matches!(
        engine.log_activity(&gone.id, "u1", "viewed", None),
        Err(AnalyticsError::NotFound(_))
    ));
}

#[rstest]
#[case("")]
#[case("   ")]
fn test_log_activity_rejects_empty_action(#[case] action: &str) {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let b = add(&store, "w1", BookmarkType::Message, "m", "");
    let mut engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

    let err = engine.log_activity(&b.id, "u1", action, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
