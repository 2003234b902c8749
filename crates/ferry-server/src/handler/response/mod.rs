//! Response types.

mod error_response;
mod migrations;
mod monitors;

pub use error_response::ErrorResponse;
pub use migrations::{Collections, ConnectionCheck, Folders, ProjectCheck};
pub use monitors::HealthStatus;
