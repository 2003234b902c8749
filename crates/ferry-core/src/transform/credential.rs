//! Upgrade of plaintext user credentials to salted hashes.
//!
//! A user record is in one of these shapes:
//!
//! | shape        | password | hash + salt  | result                                     |
//! |--------------|----------|--------------|--------------------------------------------|
//! | legacy       | yes      | neither      | hashed, password removed, `Converted`      |
//! | secured      | any      | both         | password removed if any, `AlreadySecure`   |
//! | bare         | no       | any          | copied as is, `Unchanged`                  |
//! | inconsistent | yes      | only one     | rejected                                   |
//!
//! A null field counts as absent. No placeholder password is ever hashed.

use jiff::Timestamp;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::{RecordTransform, TransformEffect, TransformOutcome};
use crate::TRACING_TARGET_TRANSFORM;
use crate::error::{Error, Result};
use crate::types::{Document, Value};

/// Salt length in bytes, before hex encoding.
const SALT_LEN: usize = 16;

/// Names of the fields the upgrade reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFields {
    /// Plaintext password.
    pub password: String,
    /// Hex-encoded SHA-256 of password and salt.
    pub hash: String,
    /// Hex-encoded salt.
    pub salt: String,
    /// Consent flags defaulted to `true` when absent.
    pub consents: Vec<String>,
    /// Timestamps backfilled when absent.
    pub timestamps: Vec<String>,
}

impl Default for CredentialFields {
    fn default() -> Self {
        Self {
            password: "senha".into(),
            hash: "senhaHash".into(),
            salt: "salt".into(),
            consents: vec!["aceitouTermos".into(), "aceitouPrivacidade".into()],
            timestamps: vec!["criadoEm".into(), "atualizadoEm".into()],
        }
    }
}

/// Shape of a user record.
enum Shape {
    Legacy {
        password: Option<String>,
        type_name: &'static str,
    },
    Secured {
        plaintext: bool,
    },
    Bare,
    Inconsistent {
        missing_salt: bool,
    },
}

/// Replaces plaintext passwords by a salted SHA-256 hash.
#[derive(Debug, Clone)]
pub struct CredentialUpgrade {
    fields: CredentialFields,
    executed_at: Timestamp,
}

impl CredentialUpgrade {
    /// Creates the transform. `executed_at` backfills missing timestamps.
    pub fn new(fields: CredentialFields, executed_at: Timestamp) -> Self {
        Self {
            fields,
            executed_at,
        }
    }

    fn classify(&self, document: &Document) -> Shape {
        let password = document
            .fields
            .get(&self.fields.password)
            .filter(|value| !value.is_null());
        let has_hash = document.has(&self.fields.hash);
        let has_salt = document.has(&self.fields.salt);

        match (password, has_hash, has_salt) {
            (password, true, true) => Shape::Secured {
                plaintext: password.is_some(),
            },
            (None, _, _) => Shape::Bare,
            (Some(value), false, false) => Shape::Legacy {
                password: value.to_text(),
                type_name: value.type_name(),
            },
            (Some(_), has_hash, _) => Shape::Inconsistent {
                missing_salt: has_hash,
            },
        }
    }

    fn upgrade(&self, mut document: Document, password: String) -> Document {
        let salt = generate_salt();
        let hash = hash_password(&password, &salt);

        document.fields.remove(&self.fields.password);
        document
            .fields
            .insert(self.fields.hash.clone(), Value::String(hash));
        document
            .fields
            .insert(self.fields.salt.clone(), Value::String(salt));

        for consent in &self.fields.consents {
            if !document.has(consent) {
                document.fields.insert(consent.clone(), Value::Boolean(true));
            }
        }
        for timestamp in &self.fields.timestamps {
            if !document.has(timestamp) {
                document
                    .fields
                    .insert(timestamp.clone(), Value::Timestamp(self.executed_at));
            }
        }

        document
    }
}

impl RecordTransform for CredentialUpgrade {
    fn apply(&self, mut document: Document) -> Result<TransformOutcome> {
        match self.classify(&document) {
            Shape::Bare => Ok(TransformOutcome::unchanged(document)),
            Shape::Inconsistent { missing_salt } => {
                let missing = if missing_salt {
                    &self.fields.salt
                } else {
                    &self.fields.hash
                };
                Err(Error::transform(format!(
                    "plaintext `{}` present but `{missing}` missing",
                    self.fields.password
                )))
            }
            Shape::Secured { plaintext } => {
                if plaintext {
                    document.fields.remove(&self.fields.password);
                    tracing::warn!(
                        target: TRACING_TARGET_TRANSFORM,
                        document_id = %document.id,
                        "plaintext password dropped from secured record"
                    );
                }
                Ok(TransformOutcome {
                    document,
                    effect: TransformEffect::AlreadySecure,
                })
            }
            Shape::Legacy {
                password,
                type_name,
            } => {
                let password = password.ok_or_else(|| {
                    Error::transform(format!(
                        "`{}` holds a {type_name} value",
                        self.fields.password
                    ))
                })?;

                let document = self.upgrade(document, password);
                tracing::debug!(
                    target: TRACING_TARGET_TRANSFORM,
                    document_id = %document.id,
                    "credential upgraded"
                );

                Ok(TransformOutcome {
                    document,
                    effect: TransformEffect::Converted,
                })
            }
        }
    }
}

/// Returns the hex-encoded SHA-256 of `password` followed by `salt`.
#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    hex::encode(salt)
}
