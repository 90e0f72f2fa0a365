//! Property-based tests for search paging.

use markvault::database::Database;
use markvault::managers::bookmark_store::{BookmarkStore, SqliteBookmarkStore};
use markvault::services::analytics_engine::{AnalyticsEngine, AnalyticsEngineTrait};
use markvault::types::analytics::SearchParams;
use markvault::types::bookmark::{BookmarkType, NewBookmark};
use markvault::types::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use markvault::types::settings::QuerySettings;
use proptest::prelude::*;

// **Property: page sizes are bounded and pages partition the result set**
//
// *For any* number of bookmarks and any requested page size, each page holds
// at most the effective size (20 when omitted, never above 100), the reported
// total is exact, and walking every page returns each bookmark once.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn pages_are_bounded_and_complete(
        count in 0usize..130,
        requested in proptest::option::of(0u32..600),
    ) {
        let db = Database::open_in_memory()
            .expect("Failed to open in-memory database");
        let store = SqliteBookmarkStore::new(db.connection());
        for i in 0..count {
            store
                .create(NewBookmark {
                    user_id: "u1".into(),
                    workspace_id: "w1".into(),
                    folder_id: None,
                    bookmark_type: BookmarkType::Message,
                    title: format!("item {}", i),
                    description: String::new(),
                    target_id: format!("m{}", i),
                    target_url: None,
                    metadata: None,
                })
                .expect("create should succeed");
        }
        let engine = AnalyticsEngine::new(db.connection(), &store, QuerySettings::default());

        let effective = match requested {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(n) => n.min(MAX_PAGE_SIZE),
        };

        let mut seen = Vec::new();
        let mut page_no = 0;
        loop {
            let page = engine
                .search("u1", &SearchParams { page: page_no, page_size: requested, ..Default::default() })
                .expect("search should succeed");
            prop_assert_eq!(page.page_size, effective);
            prop_assert!(page.items.len() <= effective as usize);
            prop_assert_eq!(page.total, count as i64);
            if page.items.is_empty() {
                break;
            }
            seen.extend(page.items.into_iter().map(|b| b.id));
            page_no += 1;
        }

        prop_assert_eq!(seen.len(), count);
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), count);
    }
}
