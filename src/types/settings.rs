use serde::{Deserialize, Serialize};

use super::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Top-level engine settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSettings {
    /// SQLite database file. `:memory:` opens a throwaway in-memory store.
    pub database_path: String,
    /// `tracing` filter directive used when `MARKVAULT_LOG` is unset.
    pub log_filter: String,
    pub query: QuerySettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            database_path: "markvault.db".to_string(),
            log_filter: "info".to_string(),
            query: QuerySettings::default(),
        }
    }
}

/// Paging and windowing knobs for the query engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Window for the "recent" stats bucket.
    pub recent_window_days: u32,
    /// Rows fetched per round trip while exporting.
    pub export_batch_size: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            recent_window_days: 7,
            export_batch_size: 500,
        }
    }
}
