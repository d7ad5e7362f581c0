//! Authentication-account management.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::{Credentials, IdentityError};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Removes user accounts from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Delete the account for `uid`.
    ///
    /// Fails with [`IdentityError::UserNotFound`] when no such account exists.
    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError>;
}

/// Firebase Auth through the Identity Toolkit REST API.
pub struct FirebaseAuth {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: Option<String>,
}

impl FirebaseAuth {
    pub fn new(base_url: &str, credentials: &Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: credentials.project_id.clone(),
            access_token: credentials.access_token.clone(),
        }
    }

    fn delete_url(&self) -> String {
        format!("{}/projects/{}/accounts:delete", self.base_url, self.project_id)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError> {
        let url = self.delete_url();
        let mut req = self.client.post(&url).json(&json!({ "localId": uid }));
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(uid, status.as_u16(), body));
        }

        info!(uid, "deleted auth account");
        Ok(())
    }
}

fn classify_failure(uid: &str, status: u16, body: String) -> IdentityError {
    if body.contains("USER_NOT_FOUND") {
        IdentityError::UserNotFound(uid.to_string())
    } else {
        IdentityError::Server { status, body }
    }
}
