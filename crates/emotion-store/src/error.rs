use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document store returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid document path segment: {0:?}")]
    InvalidPath(String),

    #[error("unsupported field value: {0}")]
    UnsupportedValue(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity provider returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("no account for uid {0}")]
    UserNotFound(String),
}

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("no credentials: set {env} or provide {}", .path.display())]
    Missing { env: &'static str, path: PathBuf },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid credentials JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("credentials have an empty project_id")]
    MissingProjectId,
}
