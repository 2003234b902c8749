//! Application state and dependency injection.

mod config;
mod connector;
mod migration;

use std::sync::Arc;

use ferry_core::connection::ProjectConnector;

pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder, ServiceConfigBuilderError};
pub use crate::service::connector::GoogleConnector;
pub use crate::service::migration::{FolderListing, MigrationService, ProjectProbe};
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    pub migrations: MigrationService,
}

impl ServiceState {
    /// Builds the state that talks to Google Cloud.
    ///
    /// Nothing connects yet; every request opens its own connections.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let connector = GoogleConnector::new(config.firestore_config());
        Self::with_connector(config, Arc::new(connector))
    }

    /// Builds the state around any connector.
    pub fn with_connector(
        config: &ServiceConfig,
        connector: Arc<dyn ProjectConnector>,
    ) -> Result<Self> {
        let migrations = MigrationService::new(
            connector,
            config.credential_resolver(),
            config.migration_options()?,
        );
        Ok(Self { migrations })
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(migrations: MigrationService);
