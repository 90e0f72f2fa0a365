//! Schema migrations for the MarkVault SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// Migrations are versioned: each runs exactly once and is recorded in
/// the `schema_version` table. Safe to call on every startup.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    // WAL, foreign keys and a busy timeout apply per connection, not per schema.
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Bookmarks, folders, tags, collections and versions")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Favorites, reminders and expirations")?;
    }

    if current < 3 {
        migration_v3(conn)?;
        record_version(conn, 3, "Bookmark shares and activity log")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = chrono::Utc::now().timestamp_millis();
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: the bookmark record and the relations around it.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS bookmark_folders (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            workspace_id TEXT NOT NULL,
            name TEXT NOT NULL,
            parent_id TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (parent_id) REFERENCES bookmark_folders(id)
        );

        CREATE INDEX IF NOT EXISTS idx_folders_owner ON bookmark_folders(user_id, workspace_id);

        CREATE TABLE IF NOT EXISTS bookmarks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            workspace_id TEXT NOT NULL,
            folder_id TEXT,
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            target_id TEXT NOT NULL,
            target_url TEXT,
            metadata TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER,
            FOREIGN KEY (folder_id) REFERENCES bookmark_folders(id)
        );

        CREATE INDEX IF NOT EXISTS idx_bookmarks_owner ON bookmarks(user_id, workspace_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_target ON bookmarks(user_id, target_id, type);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_folder ON bookmarks(folder_id);

        CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            workspace_id TEXT NOT NULL,
            name TEXT NOT NULL,
            color TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tags_owner ON tags(user_id, workspace_id);

        CREATE TABLE IF NOT EXISTS bookmark_tags (
            id TEXT PRIMARY KEY,
            bookmark_id TEXT NOT NULL,
            tag_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(bookmark_id, tag_id),
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id),
            FOREIGN KEY (tag_id) REFERENCES tags(id)
        );

        CREATE INDEX IF NOT EXISTS idx_bookmark_tags_tag ON bookmark_tags(tag_id);

        CREATE TABLE IF NOT EXISTS collections (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            workspace_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            color TEXT,
            icon TEXT,
            is_public INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_collections_owner ON collections(user_id, workspace_id);
        CREATE INDEX IF NOT EXISTS idx_collections_public ON collections(workspace_id, is_public);

        CREATE TABLE IF NOT EXISTS collection_bookmarks (
            id TEXT PRIMARY KEY,
            collection_id TEXT NOT NULL,
            bookmark_id TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            UNIQUE(collection_id, bookmark_id),
            FOREIGN KEY (collection_id) REFERENCES collections(id),
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id)
        );

        CREATE TABLE IF NOT EXISTS bookmark_versions (
            id TEXT PRIMARY KEY,
            bookmark_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            target_url TEXT,
            metadata TEXT,
            version INTEGER NOT NULL,
            change_note TEXT,
            created_at INTEGER NOT NULL,
            UNIQUE(bookmark_id, version),
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id)
        );
        ",
    )
}

/// V2: per-user side tables polled by the external timer.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS favorites (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            bookmark_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(user_id, bookmark_id),
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id)
        );

        CREATE TABLE IF NOT EXISTS reminders (
            id TEXT PRIMARY KEY,
            bookmark_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            remind_at INTEGER NOT NULL,
            message TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            fired_at INTEGER,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id)
        );

        CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders(status, remind_at);

        CREATE TABLE IF NOT EXISTS expirations (
            id TEXT PRIMARY KEY,
            bookmark_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            action TEXT NOT NULL DEFAULT 'archive',
            is_expired INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id)
        );

        CREATE INDEX IF NOT EXISTS idx_expirations_due ON expirations(user_id, is_expired, expires_at);
        ",
    )
}

/// V3: shares between users and the per-bookmark activity log.
fn migration_v3(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS shared_bookmarks (
            id TEXT PRIMARY KEY,
            bookmark_id TEXT NOT NULL,
            shared_by TEXT NOT NULL,
            shared_with TEXT NOT NULL,
            workspace_id TEXT NOT NULL,
            message TEXT,
            is_accepted INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(bookmark_id, shared_with),
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id)
        );

        CREATE INDEX IF NOT EXISTS idx_shares_with ON shared_bookmarks(shared_with, is_accepted);
        CREATE INDEX IF NOT EXISTS idx_shares_by ON shared_bookmarks(shared_by);

        CREATE TABLE IF NOT EXISTS bookmark_activity (
            id TEXT PRIMARY KEY,
            bookmark_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            action TEXT NOT NULL,
            details TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id)
        );

        CREATE INDEX IF NOT EXISTS idx_activity_bookmark ON bookmark_activity(bookmark_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_activity_user ON bookmark_activity(user_id, created_at);
        ",
    )
}
