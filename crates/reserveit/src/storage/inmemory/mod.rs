//! In-memory storage backend.
//!
//! Stores reservations in a `HashMap` wrapped in `Arc<RwLock<_>>`. Data is
//! not persisted, which makes it a fit for tests and local development.
//!
//! # Example
//!
//! ```rust,ignore
//! use reserveit::storage::inmemory::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! ```

mod repository;

pub use repository::InMemoryRepository;
