//! Data model shared by the stores and the migrators.
//!
//! - [`Value`] and [`Fields`]: the tagged-union representation of document
//!   fields, so transforms can match on record shape.
//! - [`Document`]: a document id plus its fields.
//! - [`BlobObject`]: a fully buffered bucket object with its metadata.

mod blob;
mod document;
mod value;

pub use blob::BlobObject;
pub use document::Document;
pub use value::{Fields, Value};
