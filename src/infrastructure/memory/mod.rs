//! In-process storage backend.
//!
//! [`InMemoryStore`] implements every repository trait behind one
//! `tokio::sync::RwLock`. It is selected with `STORAGE_BACKEND=memory` and
//! backs the HTTP integration tests.

mod store;

pub use store::InMemoryStore;
