//! Configuration for the Firestore client.

use std::time::Duration;

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Id of the default database of a project.
pub const DEFAULT_DATABASE: &str = "(default)";

/// Default Firestore REST endpoint.
const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Default OAuth token endpoint.
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Documents requested per page when listing a collection.
const DEFAULT_PAGE_SIZE: u32 = 300;

/// Configuration for the Firestore client.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Timeout for each HTTP request.
    pub timeout: Duration,
    /// Database id within the project.
    pub database: String,
    /// REST endpoint, without trailing slash.
    pub base_url: String,
    /// OAuth token endpoint.
    pub token_url: String,
    /// Documents per listing page.
    pub page_size: u32,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            database: DEFAULT_DATABASE.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            token_url: DEFAULT_TOKEN_URL.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FirestoreConfig {
    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the database id.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Returns the effective page size, clamped to `1..=1000`.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, 1000)
    }

    pub(crate) fn user_agent() -> String {
        format!("ferry/{}", env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FirestoreConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.database, "(default)");
        assert!(config.base_url.ends_with("/v1"));
    }

    #[test]
    fn effective_values() {
        let config = FirestoreConfig {
            timeout: Duration::ZERO,
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.effective_page_size(), 1);
    }
}
