//! Paging and batch-result types shared by the managers.

use serde::{Deserialize, Serialize};

use crate::types::errors::ErrorKind;

/// Page size used when the caller does not give one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Upper bound applied to every requested page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based, offset paging request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Builds a request, substituting `default_size` for a zero/absent size and
    /// clamping to `max_size`.
    pub fn normalized(page: u32, page_size: Option<u32>, default_size: u32, max_size: u32) -> Self {
        let size = match page_size {
            Some(0) | None => default_size,
            Some(n) => n,
        };
        Self {
            page,
            page_size: size.min(max_size).max(1),
        }
    }

    /// Same as [`PageRequest::normalized`] with the crate defaults.
    pub fn new(page: u32, page_size: Option<u32>) -> Self {
        Self::normalized(page, page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, None)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }
}

/// Why one item of a best-effort batch was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub id: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of a best-effort, per-item batch operation.
///
/// Batches are not atomic as a whole: `applied` items stay applied even when
/// other items fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Items that changed state.
    pub applied: usize,
    /// Items that were already in the requested state.
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchResult {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn fail(&mut self, id: &str, kind: ErrorKind, message: impl Into<String>) {
        self.failures.push(ItemFailure {
            id: id.to_string(),
            kind,
            message: message.into(),
        });
    }
}
