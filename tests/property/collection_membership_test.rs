//! Property-based tests for collection membership.

use markvault::database::Database;
use markvault::managers::bookmark_store::{BookmarkStore, SqliteBookmarkStore};
use markvault::managers::collection_manager::{CollectionManager, CollectionManagerTrait};
use markvault::types::bookmark::{BookmarkType, NewBookmark};
use markvault::types::collection::NewCollection;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(Vec<usize>),
    Remove(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::collection::vec(0usize..5, 1..4).prop_map(Op::Add),
        (0usize..5).prop_map(Op::Remove),
    ]
}

// **Property: one membership per bookmark, positions strictly increasing**
//
// *For any* sequence of adds and removes, each bookmark appears at most once,
// membership matches a simple set model, and listed positions ascend.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn memberships_match_model(ops in proptest::collection::vec(arb_op(), 1..20)) {
        let db = Database::open_in_memory()
            .expect("Failed to open in-memory database");
        let store = SqliteBookmarkStore::new(db.connection());
        let pool: Vec<String> = (0..5)
            .map(|i| {
                store
                    .create(NewBookmark {
                        user_id: "u1".into(),
                        workspace_id: "w1".into(),
                        folder_id: None,
                        bookmark_type: BookmarkType::Channel,
                        title: format!("b{}", i),
                        description: String::new(),
                        target_id: format!("c{}", i),
                        target_url: None,
                        metadata: None,
                    })
                    .expect("create should succeed")
                    .id
            })
            .collect();
        let mut mgr = CollectionManager::new(db.connection());
        let collection = mgr
            .create_collection(NewCollection {
                user_id: "u1".into(),
                workspace_id: "w1".into(),
                name: "c".into(),
                ..Default::default()
            })
            .expect("create collection");

        // Members in insertion order.
        let mut model: Vec<String> = Vec::new();
        for op in ops {
            match op {
                Op::Add(indices) => {
                    let ids: Vec<String> = indices.iter().map(|i| pool[*i].clone()).collect();
                    mgr.add_bookmarks(&collection.id, &ids).expect("add should succeed");
                    for id in ids {
                        if !model.contains(&id) {
                            model.push(id);
                        }
                    }
                }
                Op::Remove(i) => {
                    mgr.remove_bookmark(&collection.id, &pool[i]).expect("remove should succeed");
                    model.retain(|id| id != &pool[i]);
                }
            }
        }

        let members = mgr.memberships(&collection.id).expect("memberships");
        let listed: Vec<String> = members.iter().map(|m| m.bookmark_id.clone()).collect();
        prop_assert_eq!(listed, model.clone());
        prop_assert!(members.windows(2).all(|w| w[0].position < w[1].position));
        prop_assert_eq!(
            mgr.count_bookmarks(&collection.id).expect("count"),
            model.len() as i64
        );
    }
}
