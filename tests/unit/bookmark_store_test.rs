//! Unit tests for `SqliteBookmarkStore`: the bookmark record, folders and
//! soft delete.

use markvault::database::Database;
use markvault::managers::bookmark_store::{BookmarkStore, SqliteBookmarkStore};
use markvault::types::bookmark::{BookmarkType, NewBookmark};
use markvault::types::errors::StoreError;

fn setup() -> (Database, ()) {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    (db, ())
}

fn new_bookmark(title: &str) -> NewBookmark {
    NewBookmark {
        user_id: "u1".into(),
        workspace_id: "w1".into(),
        folder_id: None,
        bookmark_type: BookmarkType::Message,
        title: title.into(),
        description: String::new(),
        target_id: format!("target-{}", title),
        target_url: None,
        metadata: None,
    }
}

#[test]
fn test_create_and_get() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());

    let created = store.create(new_bookmark("Standup notes")).unwrap();
    let loaded = store.get(&created.id).unwrap();

    assert_eq!(loaded, created);
    assert!(loaded.is_live());
    assert_eq!(loaded.bookmark_type, BookmarkType::Message);
}

/// Bookmarks are appended at the next position within their folder.
#[test]
fn test_positions_append_per_folder() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let folder = store.create_folder("u1", "w1", "Work", None).unwrap();

    let a = store.create(new_bookmark("a")).unwrap();
    let b = store.create(new_bookmark("b")).unwrap();
    let mut in_folder = new_bookmark("c");
    in_folder.folder_id = Some(folder.id.clone());
    let c = store.create(in_folder).unwrap();

    assert_eq!(a.position, 0);
    assert_eq!(b.position, 1);
    assert_eq!(c.position, 0);
}

#[test]
fn test_create_into_missing_folder_is_not_found() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let mut new = new_bookmark("orphan");
    new.folder_id = Some("no-such-folder".into());

    assert!(matches!(store.create(new), Err(StoreError::FolderNotFound(_))));
}

#[test]
fn test_create_rejects_empty_title() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    assert!(matches!(
        store.create(new_bookmark("   ")),
        Err(StoreError::InvalidArgument(_))
    ));
}

#[test]
fn test_update_persists_editable_fields() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let mut bookmark = store.create(new_bookmark("draft")).unwrap();

    bookmark.title = "final".into();
    bookmark.description = "reviewed".into();
    bookmark.target_url = Some("https://example.com/doc".into());
    bookmark.metadata = Some(r#"{"pinned":true}"#.into());
    let updated = store.update(&bookmark).unwrap();

    assert_eq!(updated.title, "final");
    assert_eq!(updated.description, "reviewed");
    assert_eq!(updated.target_url.as_deref(), Some("https://example.com/doc"));
    assert_eq!(updated.metadata.as_deref(), Some(r#"{"pinned":true}"#));
    assert!(updated.updated_at >= bookmark.created_at);
}

/// Soft-deleted bookmarks vanish from every read but stay in the table.
#[test]
fn test_soft_delete_hides_bookmark() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let bookmark = store.create(new_bookmark("gone")).unwrap();

    store.soft_delete(&bookmark.id).unwrap();

    assert!(matches!(store.get(&bookmark.id), Err(StoreError::NotFound(_))));
    assert!(store.list_by_user("u1", None, 10, 0).unwrap().is_empty());
    assert!(matches!(store.update(&bookmark), Err(StoreError::NotFound(_))));
    assert!(matches!(store.soft_delete(&bookmark.id), Err(StoreError::NotFound(_))));

    let rows: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM bookmarks WHERE deleted_at IS NOT NULL", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_list_by_user_scopes_and_pages() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    for title in ["one", "two", "three"] {
        store.create(new_bookmark(title)).unwrap();
    }
    let mut other_ws = new_bookmark("elsewhere");
    other_ws.workspace_id = "w2".into();
    store.create(other_ws).unwrap();
    let mut other_user = new_bookmark("theirs");
    other_user.user_id = "u2".into();
    store.create(other_user).unwrap();

    assert_eq!(store.list_by_user("u1", None, 10, 0).unwrap().len(), 4);
    let ws1 = store.list_by_user("u1", Some("w1"), 10, 0).unwrap();
    assert_eq!(
        ws1.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
        vec!["one", "two", "three"]
    );
    let second_page = store.list_by_user("u1", Some("w1"), 2, 2).unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].title, "three");
}

#[test]
fn test_folders_listed_by_position() {
    let (db, _) = setup();
    let store = SqliteBookmarkStore::new(db.connection());
    let root = store.create_folder("u1", "w1", "Root", None).unwrap();
    let child = store.create_folder("u1", "w1", "Child", Some(&root.id)).unwrap();
    store.create_folder("u1", "w2", "Other", None).unwrap();

    assert_eq!(child.parent_id.as_deref(), Some(root.id.as_str()));
    assert_eq!(store.list_folders("u1", Some("w1")).unwrap().len(), 2);
    assert_eq!(store.list_folders("u1", None).unwrap().len(), 3);
    assert!(matches!(
        store.create_folder("u1", "w1", "Lost", Some("missing")),
        Err(StoreError::FolderNotFound(_))
    ));
}
