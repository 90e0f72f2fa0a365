// MarkVault shared type definitions
// Each submodule defines types used across the engine.

pub mod activity;
pub mod analytics;
pub mod bookmark;
pub mod collection;
pub mod errors;
pub mod page;
pub mod schedule;
pub mod settings;
pub mod sharing;
pub mod tag;
pub mod version;
