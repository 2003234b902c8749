//! Firestore REST client for ferry.
//!
//! [`FirestoreClient`] implements [`ferry_core::store::DocumentStore`] for one
//! project database.
//!
//! # Example
//!
//! ```rust,ignore
//! use ferry_firestore::{FirestoreClient, FirestoreConfig};
//!
//! let client = FirestoreClient::new(FirestoreConfig::default(), &credentials)?;
//! client.verify().await?;
//! let collections = client.list_collections().await?;
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Tracing target for Firestore client operations.
pub const TRACING_TARGET: &str = "ferry_firestore::client";

/// Tracing target for access token handling.
pub const TRACING_TARGET_AUTH: &str = "ferry_firestore::auth";

mod auth;
mod client;
mod config;
mod error;
mod value;

pub use crate::client::FirestoreClient;
pub use crate::config::{DEFAULT_DATABASE, FirestoreConfig};
pub use crate::error::{Error, Result};
pub use crate::value::DatabasePath;
