//! MarkVault database layer.
//!
//! Provides SQLite connection management, schema migrations, row mapping and
//! the leaf stores the managers compose.
//!
//! # Usage
//!
//! ```no_run
//! use markvault::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("markvault.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! // Access the underlying connection for queries
//! let conn = db.connection();
//! ```

pub mod activity_store;
pub mod association_store;
pub mod connection;
pub mod migrations;
pub mod rows;
pub mod version_store;

pub use activity_store::ActivityStore;
pub use association_store::AssociationStore;
pub use connection::Database;
pub use version_store::VersionStore;
