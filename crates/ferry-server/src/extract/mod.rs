//! Request extractors.
//!
//! Both extractors reject with [`handler::Error`], so malformed bodies get
//! the same JSON error shape as every other failure.
//!
//! [`handler::Error`]: crate::handler::Error

mod json;
mod validate_json;

pub use json::Json;
pub use validate_json::ValidateJson;
