//! In-memory stores and connector for testing.
//!
//! Every mock records what happened to it and supports fault injection, so
//! tests can assert on commit counts, probe order and partial failures
//! without a cloud project.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! ferry-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ferry_core::mock::MemoryConnector;
//! use ferry_core::types::Document;
//!
//! let connector = MemoryConnector::new();
//! let source = connector.add_project("acme-old");
//! source.documents.insert("usuarios", Document::empty("user1").with_field("senha", "abc123"));
//! source.buckets.create("acme-old.appspot.com");
//! connector.add_project("acme-new");
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

mod buckets;
mod connector;
mod documents;

pub use buckets::{MemoryBucket, MemoryBuckets};
pub use connector::{MemoryConnector, MemoryProject};
pub use documents::{CommitRecord, MemoryDocumentStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
