// MarkVault managers
// Managers own the stateful operations: the bookmark record, tags, collections, versions, favorites, shares and timer hooks.

pub mod bookmark_store;
pub mod collection_manager;
pub mod favorite_manager;
pub mod schedule_manager;
pub mod sharing_manager;
pub mod tag_manager;
pub mod version_manager;
