//! Unit tests for error classification and display.
//!
//! Every domain error maps onto the shared `ErrorKind` taxonomy; the RPC
//! layer and batch results rely on that mapping.

use rstest::rstest;

use markvault::types::errors::{
    AnalyticsError, Classify, CollectionError, ErrorKind, FavoriteError, ScheduleError,
    SettingsError, SharingError, StoreError, TagError, VersionError,
};

fn storage_error() -> rusqlite::Error {
    rusqlite::Error::QueryReturnedNoRows
}

#[rstest]
#[case(StoreError::NotFound("b1".into()), ErrorKind::NotFound)]
#[case(StoreError::FolderNotFound("f1".into()), ErrorKind::NotFound)]
#[case(StoreError::InvalidArgument("title is empty".into()), ErrorKind::InvalidArgument)]
#[case(StoreError::Storage(storage_error()), ErrorKind::StorageFailure)]
fn test_store_error_kinds(#[case] err: StoreError, #[case] expected: ErrorKind) {
    assert_eq!(err.kind(), expected);
}

#[rstest]
#[case(VersionError::NotFound("v1".into()), ErrorKind::NotFound)]
#[case(VersionError::BookmarkNotFound("b1".into()), ErrorKind::NotFound)]
#[case(VersionError::Conflict("version 2".into()), ErrorKind::Conflict)]
#[case(VersionError::InvalidArgument("bad".into()), ErrorKind::InvalidArgument)]
#[case(VersionError::Storage(storage_error()), ErrorKind::StorageFailure)]
fn test_version_error_kinds(#[case] err: VersionError, #[case] expected: ErrorKind) {
    assert_eq!(err.kind(), expected);
}

#[test]
fn test_other_domain_error_kinds() {
    assert_eq!(TagError::NotFound("t".into()).kind(), ErrorKind::NotFound);
    assert_eq!(TagError::BookmarkNotFound("b".into()).kind(), ErrorKind::NotFound);
    assert_eq!(CollectionError::NotFound("c".into()).kind(), ErrorKind::NotFound);
    assert_eq!(CollectionError::Storage(storage_error()).kind(), ErrorKind::StorageFailure);
    assert_eq!(AnalyticsError::InvalidArgument("q".into()).kind(), ErrorKind::InvalidArgument);
    assert_eq!(FavoriteError::BookmarkNotFound("b".into()).kind(), ErrorKind::NotFound);
    assert_eq!(
        ScheduleError::Conflict { id: "r".into(), status: "fired".into() }.kind(),
        ErrorKind::Conflict
    );
    assert_eq!(ScheduleError::NoExpiration("b".into()).kind(), ErrorKind::NotFound);
    assert_eq!(AnalyticsError::NotFound("b".into()).kind(), ErrorKind::NotFound);
    assert_eq!(SettingsError::InvalidKey("k".into()).kind(), ErrorKind::InvalidArgument);
    assert_eq!(SettingsError::IoError("disk".into()).kind(), ErrorKind::StorageFailure);
}

/// A missing bookmark seen by the version manager stays a NotFound.
#[test]
fn test_store_error_converts_into_version_error() {
    let err: VersionError = StoreError::NotFound("b1".into()).into();
    assert!(matches!(err, VersionError::BookmarkNotFound(ref id) if id == "b1"));

    let err: VersionError = StoreError::Storage(storage_error()).into();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
}

#[rstest]
#[case(SharingError::NotFound("s1".into()), ErrorKind::NotFound)]
#[case(SharingError::BookmarkNotFound("b1".into()), ErrorKind::NotFound)]
#[case(SharingError::Conflict("already accepted".into()), ErrorKind::Conflict)]
#[case(SharingError::Storage(storage_error()), ErrorKind::StorageFailure)]
fn test_sharing_error_kinds(#[case] err: SharingError, #[case] expected: ErrorKind) {
    assert_eq!(err.kind(), expected);
}

/// A missing bookmark seen by the analytics engine keeps its NotFound kind.
#[test]
fn test_store_error_converts_into_analytics_error() {
    let err: AnalyticsError = StoreError::NotFound("b1".into()).into();
    assert!(matches!(err, AnalyticsError::NotFound(ref id) if id == "b1"));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err: AnalyticsError = StoreError::FolderNotFound("f1".into()).into();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err: AnalyticsError = StoreError::InvalidArgument("title is empty".into()).into();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_error_messages_name_the_entity() {
    assert_eq!(TagError::NotFound("t1".into()).to_string(), "Tag not found: t1");
    assert_eq!(
        CollectionError::NotFound("c1".into()).to_string(),
        "Collection not found: c1"
    );
    assert_eq!(
        ScheduleError::Conflict { id: "r1".into(), status: "fired".into() }.to_string(),
        "Reminder already fired: r1"
    );
}

#[rstest]
#[case(ErrorKind::NotFound, "\"not_found\"")]
#[case(ErrorKind::Conflict, "\"conflict\"")]
#[case(ErrorKind::InvalidArgument, "\"invalid_argument\"")]
#[case(ErrorKind::StorageFailure, "\"storage_failure\"")]
fn test_error_kind_serializes_snake_case(#[case] kind: ErrorKind, #[case] expected: &str) {
    assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
    assert_eq!(kind.as_str(), expected.trim_matches('"'));
}
