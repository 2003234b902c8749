//! Source and target credential resolution.
//!
//! A request either asks for the credentials the process was configured
//! with ([`CredentialSource::Environment`]) or carries its own
//! ([`CredentialSource::Explicit`]). Both end up as [`CloudCredentials`], or
//! as an error naming the first missing field. Nothing here touches the
//! network.

use std::fmt;

use crate::TRACING_TARGET_CREDENTIALS;
use crate::connection::ProjectRole;
use crate::error::{Error, ErrorKind, Result};

/// Fully resolved service-account credentials for one project.
///
/// Never serialized. The [`Debug`] output omits the private key.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudCredentials {
    /// Cloud project id.
    pub project_id: String,
    /// Service-account email.
    pub client_email: String,
    /// PEM-encoded private key.
    pub private_key: String,
    /// Id of the private key, if known.
    pub private_key_id: Option<String>,
}

impl CloudCredentials {
    /// Returns the secret values carried by these credentials.
    pub fn secrets(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.private_key.as_str())
            .chain(self.private_key_id.as_deref())
            .filter(|secret| !secret.is_empty())
    }
}

impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("private_key_id", &self.private_key_id.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Credential fields as supplied by a caller or the environment, any of
/// which may be missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PartialCredentials {
    /// Cloud project id.
    pub project_id: Option<String>,
    /// Service-account email.
    pub client_email: Option<String>,
    /// PEM-encoded private key, possibly with escaped newlines.
    pub private_key: Option<String>,
    /// Id of the private key.
    pub private_key_id: Option<String>,
}

impl PartialCredentials {
    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.project_id.is_none()
            && self.client_email.is_none()
            && self.private_key.is_none()
            && self.private_key_id.is_none()
    }

    /// Completes the credentials or names the first missing field.
    fn complete(&self) -> Result<CloudCredentials, &'static str> {
        let project_id = required(&self.project_id).ok_or("projectId")?;
        let client_email = required(&self.client_email).ok_or("clientEmail")?;
        let private_key = required(&self.private_key).ok_or("privateKey")?;

        Ok(CloudCredentials {
            project_id: project_id.to_owned(),
            client_email: client_email.to_owned(),
            private_key: normalize_private_key(private_key),
            private_key_id: required(&self.private_key_id).map(str::to_owned),
        })
    }
}

impl fmt::Debug for PartialCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("private_key_id", &self.private_key_id.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Where the credentials of one project come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Credentials configured for the process.
    Environment,
    /// Credentials supplied with the request.
    Explicit(PartialCredentials),
}

/// Resolves [`CredentialSource`]s into [`CloudCredentials`].
///
/// Holds the environment-configured credentials of both roles.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    source: PartialCredentials,
    target: PartialCredentials,
}

impl CredentialResolver {
    /// Creates a resolver with the environment credentials of both roles.
    pub fn new(source: PartialCredentials, target: PartialCredentials) -> Self {
        Self { source, target }
    }

    /// Returns true if the environment holds complete credentials for `role`.
    #[must_use]
    pub fn has_environment(&self, role: ProjectRole) -> bool {
        self.environment(role).complete().is_ok()
    }

    /// Resolves the credentials of `role`.
    ///
    /// A missing field in caller-supplied credentials is a
    /// [`ErrorKind::Config`] error. A missing field in the environment is a
    /// server misconfiguration and is reported as [`ErrorKind::Internal`].
    pub fn resolve(&self, role: ProjectRole, source: &CredentialSource) -> Result<CloudCredentials> {
        let resolved = match source {
            CredentialSource::Explicit(partial) => partial.complete().map_err(|field| {
                Error::config(format!("{role} credentials: missing required field `{field}`"))
            }),
            CredentialSource::Environment => {
                self.environment(role).complete().map_err(|field| {
                    Error::new(
                        ErrorKind::Internal,
                        format!(
                            "{role} credentials are not configured: missing `{}`",
                            env_var_name(role, field)
                        ),
                    )
                })
            }
        }?;

        check_private_key(role, source, &resolved)?;

        tracing::debug!(
            target: TRACING_TARGET_CREDENTIALS,
            role = %role,
            project_id = %resolved.project_id,
            explicit = matches!(source, CredentialSource::Explicit(_)),
            "credentials resolved"
        );

        Ok(resolved)
    }

    fn environment(&self, role: ProjectRole) -> &PartialCredentials {
        match role {
            ProjectRole::Source => &self.source,
            ProjectRole::Target => &self.target,
        }
    }
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Replaces literal `\n` escapes with newlines.
fn normalize_private_key(key: &str) -> String {
    key.replace("\\n", "\n")
}

fn check_private_key(
    role: ProjectRole,
    source: &CredentialSource,
    credentials: &CloudCredentials,
) -> Result<()> {
    if credentials.private_key.contains("PRIVATE KEY-----") {
        return Ok(());
    }

    Err(match source {
        CredentialSource::Explicit(_) => Error::config(format!(
            "{role} credentials: `privateKey` is not a PEM-encoded private key"
        )),
        CredentialSource::Environment => Error::new(
            ErrorKind::Internal,
            format!(
                "{role} credentials are misconfigured: `{}` is not a PEM-encoded private key",
                env_var_name(role, "privateKey")
            ),
        ),
    })
}

fn env_var_name(role: ProjectRole, field: &str) -> String {
    let prefix = match role {
        ProjectRole::Source => "SOURCE",
        ProjectRole::Target => "TARGET",
    };
    let suffix = match field {
        "projectId" => "PROJECT_ID",
        "clientEmail" => "CLIENT_EMAIL",
        "privateKey" => "PRIVATE_KEY",
        _ => "PRIVATE_KEY_ID",
    };
    format!("{prefix}_{suffix}")
}
