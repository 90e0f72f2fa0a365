use serde::{Deserialize, Serialize};
use thiserror::Error;

// === ErrorKind ===

/// Transport-agnostic classification shared by every error in the crate.
///
/// Callers map `NotFound` to a 404-equivalent and `Conflict` to a
/// 409-equivalent; `StorageFailure` is the underlying store's error, passed
/// through without retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidArgument,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

/// Errors that can be classified into an [`ErrorKind`].
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

// === StoreError ===

/// Errors raised by the bookmark store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Bookmark with the given ID was not found (or is tombstoned).
    #[error("Bookmark not found: {0}")]
    NotFound(String),
    /// Folder with the given ID was not found.
    #[error("Bookmark folder not found: {0}")]
    FolderNotFound(String),
    /// The provided input is malformed.
    #[error("Invalid bookmark input: {0}")]
    InvalidArgument(String),
    /// Database operation failed.
    #[error("Bookmark storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) | StoreError::FolderNotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StoreError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

// === TagError ===

/// Errors related to tags and tag associations.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Tag not found: {0}")]
    NotFound(String),
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),
    #[error("Tag storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Classify for TagError {
    fn kind(&self) -> ErrorKind {
        match self {
            TagError::NotFound(_) | TagError::BookmarkNotFound(_) => ErrorKind::NotFound,
            TagError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

// === CollectionError ===

/// Errors related to collections and their memberships.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Collection not found: {0}")]
    NotFound(String),
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),
    #[error("Collection storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Classify for CollectionError {
    fn kind(&self) -> ErrorKind {
        match self {
            CollectionError::NotFound(_) | CollectionError::BookmarkNotFound(_) => {
                ErrorKind::NotFound
            }
            CollectionError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

// === VersionError ===

/// Errors related to bookmark version history.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Version does not exist or belongs to another bookmark.
    #[error("Version not found: {0}")]
    NotFound(String),
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),
    /// Two writers computed the same version number.
    #[error("Version conflict: {0}")]
    Conflict(String),
    #[error("Invalid version input: {0}")]
    InvalidArgument(String),
    #[error("Version storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Classify for VersionError {
    fn kind(&self) -> ErrorKind {
        match self {
            VersionError::NotFound(_) | VersionError::BookmarkNotFound(_) => ErrorKind::NotFound,
            VersionError::Conflict(_) => ErrorKind::Conflict,
            VersionError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            VersionError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

impl From<StoreError> for VersionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => VersionError::BookmarkNotFound(id),
            StoreError::FolderNotFound(id) => VersionError::InvalidArgument(format!(
                "folder {} no longer exists",
                id
            )),
            StoreError::InvalidArgument(msg) => VersionError::InvalidArgument(msg),
            StoreError::Storage(e) => VersionError::Storage(e),
        }
    }
}

// === AnalyticsError ===

/// Errors raised by the query and analytics engine.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid query: {0}")]
    InvalidArgument(String),
    #[error("Bookmark not found: {0}")]
    NotFound(String),
    #[error("Folder not found: {0}")]
    FolderNotFound(String),
    #[error("Analytics storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Classify for AnalyticsError {
    fn kind(&self) -> ErrorKind {
        match self {
            AnalyticsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AnalyticsError::NotFound(_) | AnalyticsError::FolderNotFound(_) => ErrorKind::NotFound,
            AnalyticsError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

impl From<StoreError> for AnalyticsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AnalyticsError::NotFound(id),
            StoreError::InvalidArgument(msg) => AnalyticsError::InvalidArgument(msg),
            StoreError::FolderNotFound(id) => AnalyticsError::FolderNotFound(id),
            StoreError::Storage(e) => AnalyticsError::Storage(e),
        }
    }
}

// === FavoriteError ===

/// Errors related to favorites.
#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),
    #[error("Favorite storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Classify for FavoriteError {
    fn kind(&self) -> ErrorKind {
        match self {
            FavoriteError::BookmarkNotFound(_) => ErrorKind::NotFound,
            FavoriteError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

// === ScheduleError ===

/// Errors related to reminders and expirations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Reminder not found: {0}")]
    ReminderNotFound(String),
    /// No expiration row has this id.
    #[error("Expiration not found: {0}")]
    ExpirationNotFound(String),
    /// The bookmark with this id has no expiration set.
    #[error("No expiration set for bookmark: {0}")]
    NoExpiration(String),
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),
    /// Reminder is no longer pending.
    #[error("Reminder already {status}: {id}")]
    Conflict { id: String, status: String },
    #[error("Schedule storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Classify for ScheduleError {
    fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::ReminderNotFound(_)
            | ScheduleError::ExpirationNotFound(_)
            | ScheduleError::NoExpiration(_)
            | ScheduleError::BookmarkNotFound(_) => ErrorKind::NotFound,
            ScheduleError::Conflict { .. } => ErrorKind::Conflict,
            ScheduleError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

// === SharingError ===

/// Errors related to sharing bookmarks between users.
#[derive(Debug, Error)]
pub enum SharingError {
    #[error("Share not found: {0}")]
    NotFound(String),
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),
    /// Bookmark already shared with the recipient, or share already accepted.
    #[error("Share conflict: {0}")]
    Conflict(String),
    #[error("Sharing storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Classify for SharingError {
    fn kind(&self) -> ErrorKind {
        match self {
            SharingError::NotFound(_) | SharingError::BookmarkNotFound(_) => ErrorKind::NotFound,
            SharingError::Conflict(_) => ErrorKind::Conflict,
            SharingError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

impl From<StoreError> for SharingError {
    fn from(err: StoreError) -> Self {
        match err {
            // `get` is the only store call made while sharing.
            StoreError::NotFound(id) | StoreError::FolderNotFound(id) | StoreError::InvalidArgument(id) => {
                SharingError::BookmarkNotFound(id)
            }
            StoreError::Storage(e) => SharingError::Storage(e),
        }
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

impl Classify for SettingsError {
    fn kind(&self) -> ErrorKind {
        match self {
            SettingsError::InvalidKey(_) | SettingsError::InvalidValue(_) => {
                ErrorKind::InvalidArgument
            }
            SettingsError::IoError(_) | SettingsError::SerializationError(_) => {
                ErrorKind::StorageFailure
            }
        }
    }
}
