#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for credential resolution.
pub const TRACING_TARGET_CREDENTIALS: &str = "ferry_core::credentials";

/// Tracing target for project connections.
pub const TRACING_TARGET_CONNECTION: &str = "ferry_core::connection";

/// Tracing target for bucket location.
pub const TRACING_TARGET_BUCKET: &str = "ferry_core::bucket";

/// Tracing target for record transforms.
pub const TRACING_TARGET_TRANSFORM: &str = "ferry_core::transform";

/// Tracing target for document and blob migration.
pub const TRACING_TARGET_MIGRATE: &str = "ferry_core::migrate";

mod error;

pub mod bucket;
pub mod connection;
pub mod credentials;
pub mod migrate;
pub mod prelude;
pub mod report;
pub mod store;
pub mod transform;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use error::{BoxedError, Error, ErrorKind, Result};
