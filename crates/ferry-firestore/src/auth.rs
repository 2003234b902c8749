//! Service-account access tokens.
//!
//! A signed RS256 assertion is exchanged at the OAuth token endpoint for a
//! bearer token. The token is cached and refreshed shortly before it expires.

use std::fmt;

use ferry_core::credentials::CloudCredentials;
use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::TRACING_TARGET_AUTH;
use crate::error::{Error, Result};

/// OAuth scope granting Firestore access.
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Grant type of the assertion exchange.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion.
const ASSERTION_LIFETIME: SignedDuration = SignedDuration::from_secs(3600);

/// Tokens this close to expiry are refreshed.
const REFRESH_MARGIN: SignedDuration = SignedDuration::from_secs(60);

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

#[derive(Clone)]
struct AccessToken {
    value: String,
    expires_at: Timestamp,
}

/// Issues and caches access tokens for one service account.
pub(crate) struct TokenSource {
    client_email: String,
    key_id: Option<String>,
    key: EncodingKey,
    token_url: String,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    /// Parses the private key. Fails without any network call on a bad key.
    pub fn new(credentials: &CloudCredentials, token_url: impl Into<String>) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())?;
        Ok(Self {
            client_email: credentials.client_email.clone(),
            key_id: credentials.private_key_id.clone(),
            key,
            token_url: token_url.into(),
            cached: Mutex::new(None),
        })
    }

    /// Returns a valid access token, fetching a new one when needed.
    pub async fn token(&self, http: &Client) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Timestamp::now();

        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > now + REFRESH_MARGIN) {
            return Ok(token.value.clone());
        }

        let token = self.fetch(http, now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: Timestamp) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        let claims = Claims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_url,
            iat: now.as_second(),
            exp: (now + ASSERTION_LIFETIME).as_second(),
        };

        Ok(encode(&header, &claims, &self.key)?)
    }

    async fn fetch(&self, http: &Client, now: Timestamp) -> Result<AccessToken> {
        let assertion = self.assertion(now)?;
        let response = http
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: TokenError = response.json().await.unwrap_or(TokenError {
                error: status.to_string(),
                error_description: String::new(),
            });
            tracing::warn!(
                target: TRACING_TARGET_AUTH,
                client_email = %self.client_email,
                status = status.as_u16(),
                error = %body.error,
                "token request rejected"
            );
            return Err(Error::Token {
                status: status.as_u16(),
                message: format!("{} {}", body.error, body.error_description)
                    .trim()
                    .to_owned(),
            });
        }

        let body: TokenResponse = response.json().await?;
        tracing::debug!(
            target: TRACING_TARGET_AUTH,
            client_email = %self.client_email,
            expires_in = body.expires_in,
            "access token issued"
        );

        Ok(AccessToken {
            value: body.access_token,
            expires_at: now + SignedDuration::from_secs(body.expires_in),
        })
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("client_email", &self.client_email)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(private_key: &str) -> CloudCredentials {
        CloudCredentials {
            project_id: "acme".into(),
            client_email: "ferry@acme.iam.gserviceaccount.com".into(),
            private_key: private_key.into(),
            private_key_id: Some("kid".into()),
        }
    }

    #[test]
    fn rejects_key_that_is_not_pem() {
        let creds = credentials("not a pem document");
        let err = TokenSource::new(&creds, "https://oauth2.googleapis.com/token").unwrap_err();
        assert_eq!(err.kind(), ferry_core::ErrorKind::Config);
    }

    #[test]
    fn claims_serialize_for_the_token_endpoint() -> anyhow::Result<()> {
        let claims = Claims {
            iss: "ferry@acme.iam.gserviceaccount.com",
            scope: DATASTORE_SCOPE,
            aud: "https://oauth2.googleapis.com/token",
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        };
        let json = serde_json::to_value(&claims)?;
        assert_eq!(json["scope"], DATASTORE_SCOPE);
        assert_eq!(json["exp"].as_i64(), Some(1_700_003_600));
        Ok(())
    }
}
