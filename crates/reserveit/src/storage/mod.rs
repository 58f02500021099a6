//! Storage backend implementations.
//!
//! This module provides concrete implementations of the repository trait
//! defined in `reserveit_core::storage`. Both backends are always compiled;
//! the one in use is chosen at startup.
//!
//! - `sqlite`: one SQLite database per resource, using `rusqlite` and `tokio-rusqlite`
//! - `inmemory`: process-local maps, for tests and throwaway deployments

pub mod inmemory;
pub mod sqlite;

pub use inmemory::InMemoryRepository;
pub use sqlite::SqliteRepository;
