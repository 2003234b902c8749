//! Middleware for `axum::Router` and HTTP request processing.
//!
//! Each concern is an extension trait over [`Router`], so the binary
//! layers them in the order it needs:
//!
//! ```rust,no_run
//! use axum::Router;
//! use ferry_server::middleware::{
//!     CorsConfig, RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt,
//!     RouterSecurityExt, SecurityHeadersConfig,
//! };
//!
//! let app: Router = Router::new()
//!     .with_security(&CorsConfig::default(), &SecurityHeadersConfig::default())
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```
//!
//! [`Router`]: axum::Router

mod observability;
mod recovery;
mod security;
mod specification;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{
    CorsConfig, FrameOptions, ReferrerPolicy, RouterSecurityExt, SecurityHeadersConfig,
};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
