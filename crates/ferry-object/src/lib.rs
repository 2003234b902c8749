#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod bucket;
mod error;
mod provider;

pub use bucket::ObjectBucket;
pub use provider::{GcsBuckets, ServiceAccountKey};

/// Tracing target for bucket operations.
pub const TRACING_TARGET: &str = "ferry_object::bucket";
