//! MarkVault: bookmark organization and history engine.
//!
//! Keeps the relational structure around a bookmark (tags, ordered
//! collections, append-only version history with restore) and the derived
//! views built on it (search, stats, duplicates, export/import). This library
//! crate exposes all modules for the RPC binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
