//! Document-store credentials.
//!
//! Resolved from the `FIREBASE_CREDENTIALS` environment variable (inline JSON)
//! first, then from a JSON file on disk. A Firebase service-account file parses
//! as-is: only `project_id` is required, everything else is ignored unless it
//! is one of the fields below.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::CredentialsError;

/// Environment variable holding inline credentials JSON.
pub const CREDENTIALS_ENV: &str = "FIREBASE_CREDENTIALS";

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub project_id: String,
    /// Pre-minted OAuth bearer token. Omit for the local emulators.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credentials {
    /// Parse credentials from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let creds: Self = serde_json::from_str(json)?;
        if creds.project_id.trim().is_empty() {
            return Err(CredentialsError::MissingProjectId);
        }
        Ok(creds)
    }

    /// Read credentials from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        let json = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Prefer inline JSON when given, otherwise read `path`.
    pub fn resolve(inline: Option<&str>, path: &Path) -> Result<Self, CredentialsError> {
        match inline.filter(|s| !s.trim().is_empty()) {
            Some(json) => Self::from_json(json),
            None if path.exists() => Self::from_file(path),
            None => Err(CredentialsError::Missing {
                env: CREDENTIALS_ENV,
                path: path.to_path_buf(),
            }),
        }
    }

    /// True once `expires_at` has passed. Tokens without an expiry never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
