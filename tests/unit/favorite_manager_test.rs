//! Unit tests for the FavoriteManager.

use markvault::database::Database;
use markvault::managers::bookmark_store::{BookmarkStore, SqliteBookmarkStore};
use markvault::managers::favorite_manager::{FavoriteManager, FavoriteManagerTrait};
use markvault::types::bookmark::{Bookmark, BookmarkType, NewBookmark};
use markvault::types::errors::FavoriteError;
use markvault::types::page::PageRequest;

fn setup() -> (Database, ()) {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    (db, ())
}

fn add_bookmark(db: &Database, title: &str) -> Bookmark {
    SqliteBookmarkStore::new(db.connection())
        .create(NewBookmark {
            user_id: "u1".into(),
            workspace_id: "w1".into(),
            folder_id: None,
            bookmark_type: BookmarkType::Thread,
            title: title.into(),
            description: String::new(),
            target_id: format!("thread-{}", title),
            target_url: None,
            metadata: None,
        })
        .unwrap()
}

#[test]
fn test_add_is_idempotent() {
    let (db, _) = setup();
    let b = add_bookmark(&db, "fav");
    let mut mgr = FavoriteManager::new(db.connection());

    assert!(mgr.add("u1", &b.id).unwrap());
    assert!(!mgr.add("u1", &b.id).unwrap());
    assert!(mgr.is_favorite("u1", &b.id).unwrap());
    assert_eq!(mgr.list("u1", PageRequest::default()).unwrap().total, 1);
}

#[test]
fn test_favorites_are_per_user() {
    let (db, _) = setup();
    let b = add_bookmark(&db, "shared");
    let mut mgr = FavoriteManager::new(db.connection());

    mgr.add("u2", &b.id).unwrap();

    assert!(!mgr.is_favorite("u1", &b.id).unwrap());
    assert!(mgr.is_favorite("u2", &b.id).unwrap());
}

#[test]
fn test_remove() {
    let (db, _) = setup();
    let b = add_bookmark(&db, "temp");
    let mut mgr = FavoriteManager::new(db.connection());
    mgr.add("u1", &b.id).unwrap();

    assert!(mgr.remove("u1", &b.id).unwrap());
    assert!(!mgr.remove("u1", &b.id).unwrap());
    assert!(!mgr.is_favorite("u1", &b.id).unwrap());
}

#[test]
fn test_add_unknown_bookmark() {
    let (db, _) = setup();
    let mut mgr = FavoriteManager::new(db.connection());

    assert!(matches!(mgr.add("u1", "missing"), Err(FavoriteError::BookmarkNotFound(_))));
}

/// Most recently favorited first; tombstoned bookmarks drop out.
#[test]
fn test_list_order_and_tombstones() {
    let (db, _) = setup();
    let first = add_bookmark(&db, "first");
    let second = add_bookmark(&db, "second");
    let third = add_bookmark(&db, "third");
    let mut mgr = FavoriteManager::new(db.connection());
    for b in [&second, &first, &third] {
        mgr.add("u1", &b.id).unwrap();
    }

    let page = mgr.list("u1", PageRequest::default()).unwrap();
    assert_eq!(
        page.items.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
        vec!["third", "first", "second"]
    );

    SqliteBookmarkStore::new(db.connection()).soft_delete(&first.id).unwrap();
    let page = mgr.list("u1", PageRequest::default()).unwrap();
    assert_eq!(page.total, 2);
    assert!(!mgr.is_favorite("u1", &first.id).unwrap());
    assert!(matches!(mgr.add("u1", &first.id), Err(FavoriteError::BookmarkNotFound(_))));
}
