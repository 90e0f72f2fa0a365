//! Property-based tests for tag associations.

use std::collections::BTreeSet;

use markvault::database::Database;
use markvault::managers::bookmark_store::{BookmarkStore, SqliteBookmarkStore};
use markvault::managers::tag_manager::{TagManager, TagManagerTrait};
use markvault::types::bookmark::{BookmarkType, NewBookmark};
use proptest::prelude::*;

fn tag_ids(mgr: &TagManager<'_>, bookmark_id: &str) -> BTreeSet<String> {
    mgr.list_tags_for_bookmark(bookmark_id)
        .expect("list should succeed")
        .into_iter()
        .map(|t| t.id)
        .collect()
}

// **Property: attach is a set union, replace is a set assignment**
//
// *For any* sequence of attach batches (with repeats) followed by a replace,
// the bookmark carries each attached tag once, and after the replace exactly
// the replacement set.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn attach_then_replace_matches_set_model(
        batches in proptest::collection::vec(proptest::collection::vec(0usize..6, 0..6), 1..5),
        replacement in proptest::collection::vec(0usize..6, 0..6),
    ) {
        let db = Database::open_in_memory()
            .expect("Failed to open in-memory database");
        let bookmark = SqliteBookmarkStore::new(db.connection())
            .create(NewBookmark {
                user_id: "u1".into(),
                workspace_id: "w1".into(),
                folder_id: None,
                bookmark_type: BookmarkType::File,
                title: "doc".into(),
                description: String::new(),
                target_id: "f1".into(),
                target_url: None,
                metadata: None,
            })
            .expect("create should succeed");
        let mut mgr = TagManager::new(db.connection());
        let pool: Vec<String> = (0..6)
            .map(|i| mgr.create_tag("u1", "w1", &format!("t{}", i), None).expect("create tag").id)
            .collect();

        let mut model = BTreeSet::new();
        for batch in batches {
            let ids: Vec<String> = batch.iter().map(|i| pool[*i].clone()).collect();
            let result = mgr.attach_tags(&bookmark.id, &ids).expect("attach should succeed");
            prop_assert!(result.is_complete());
            prop_assert_eq!(result.applied + result.skipped, ids.len());
            model.extend(ids);
            prop_assert_eq!(tag_ids(&mgr, &bookmark.id), model.clone());
        }

        let ids: Vec<String> = replacement.iter().map(|i| pool[*i].clone()).collect();
        mgr.replace_tags(&bookmark.id, &ids).expect("replace should succeed");
        let expected: BTreeSet<String> = ids.into_iter().collect();
        prop_assert_eq!(tag_ids(&mgr, &bookmark.id), expected);
    }
}
