//! User administration over a [`DocumentStore`] and an [`IdentityProvider`].

use std::sync::Arc;

use emotion_core::{UserRecord, UserUpdate};
use futures::future::join_all;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{Document, DocumentStore, IdentityError, IdentityProvider, StoreError};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where user data lives in the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionLayout {
    /// Root collection of user documents, keyed by uid.
    pub users: String,
    /// Subcollection under each user document.
    pub nested_history: String,
    /// Root collection of history entries from all users.
    pub global_history: String,
    /// Field in global history entries holding the owner's uid.
    pub owner_field: String,
}

impl Default for CollectionLayout {
    fn default() -> Self {
        Self {
            users: "users".into(),
            nested_history: "history".into(),
            global_history: "history".into(),
            owner_field: "uid".into(),
        }
    }
}

impl CollectionLayout {
    fn nested_history_of(&self, uid: &str) -> String {
        format!("{}/{uid}/{}", self.users, self.nested_history)
    }
}

/// Result of a successful user deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Nested plus global history entries removed.
    pub deleted_history_entries: usize,
    /// Whether the identity-provider account was removed.
    pub identity_deleted: bool,
}

pub struct AdminService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    layout: CollectionLayout,
}

impl AdminService {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_layout(store, identity, CollectionLayout::default())
    }

    pub fn with_layout(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        layout: CollectionLayout,
    ) -> Self {
        Self {
            store,
            identity,
            layout,
        }
    }

    pub fn layout(&self) -> &CollectionLayout {
        &self.layout
    }

    /// Every user record.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, AdminError> {
        let docs = self.store.list(&self.layout.users).await?;
        let users: Vec<UserRecord> = docs
            .into_iter()
            .map(|doc| UserRecord::from_fields(&doc.id, doc.fields))
            .collect();
        info!(count = users.len(), "listed users");
        Ok(users)
    }

    /// Write the supplied fields of `update` to the user's document.
    ///
    /// Nothing is written when no field is supplied.
    pub async fn update_user(&self, uid: &str, update: &UserUpdate) -> Result<(), AdminError> {
        let uid = validate_uid(uid)?;
        let fields = update_fields(update)?;

        self.store.update(&self.layout.users, uid, &fields).await?;
        info!(uid, fields = fields.len(), "updated user");
        Ok(())
    }

    /// Remove a user's nested history, global history, document and account.
    ///
    /// Every step runs even when an earlier one failed. The first store error
    /// is returned once all steps have been attempted; identity-provider
    /// failures are only logged.
    pub async fn delete_user(&self, uid: &str) -> Result<DeleteOutcome, AdminError> {
        let uid = validate_uid(uid)?;
        let mut failure: Option<StoreError> = None;

        let nested = self.layout.nested_history_of(uid);
        let nested_deleted = match self.store.list(&nested).await {
            Ok(docs) => self.delete_documents(&nested, docs, &mut failure).await,
            Err(e) => {
                note_failure(&mut failure, uid, "listing nested history", e);
                0
            }
        };

        let global = &self.layout.global_history;
        let owner = Value::String(uid.to_string());
        let global_deleted = match self
            .store
            .find_by_field(global, &self.layout.owner_field, &owner)
            .await
        {
            Ok(docs) => self.delete_documents(global, docs, &mut failure).await,
            Err(e) => {
                note_failure(&mut failure, uid, "querying global history", e);
                0
            }
        };

        if let Err(e) = self.store.delete(&self.layout.users, uid).await {
            note_failure(&mut failure, uid, "deleting user document", e);
        }

        let identity_deleted = match self.identity.delete_account(uid).await {
            Ok(()) => true,
            Err(IdentityError::UserNotFound(_)) => {
                warn!(uid, "no auth account to delete");
                false
            }
            Err(e) => {
                warn!(uid, error = %e, "failed to delete auth account");
                false
            }
        };

        if let Some(e) = failure {
            return Err(e.into());
        }

        let outcome = DeleteOutcome {
            deleted_history_entries: nested_deleted + global_deleted,
            identity_deleted,
        };
        info!(
            uid,
            nested = nested_deleted,
            global = global_deleted,
            identity_deleted,
            "deleted user"
        );
        Ok(outcome)
    }

    /// Delete `docs` from `collection` concurrently; returns how many succeeded.
    async fn delete_documents(
        &self,
        collection: &str,
        docs: Vec<Document>,
        failure: &mut Option<StoreError>,
    ) -> usize {
        let results = join_all(
            docs.iter()
                .map(|doc| self.store.delete(collection, &doc.id)),
        )
        .await;

        let mut deleted = 0;
        for (doc, result) in docs.iter().zip(results) {
            match result {
                Ok(()) => deleted += 1,
                Err(e) => {
                    error!(collection, id = %doc.id, error = %e, "failed to delete history entry");
                    failure.get_or_insert(e);
                }
            }
        }
        deleted
    }
}

/// Trim `uid` and check it can name a single document.
///
/// A uid is spliced into collection paths, so path separators and dot
/// segments are refused.
pub fn validate_uid(uid: &str) -> Result<&str, AdminError> {
    let uid = uid.trim();
    if uid.is_empty() {
        return Err(AdminError::InvalidInput("uid is required".into()));
    }
    if uid.contains('/') || uid == "." || uid == ".." {
        return Err(AdminError::InvalidInput(format!("invalid uid: {uid}")));
    }
    Ok(uid)
}

/// The fields an update would write; an update that writes nothing is refused.
pub fn update_fields(update: &UserUpdate) -> Result<Map<String, Value>, AdminError> {
    let fields = update.fields();
    if fields.is_empty() {
        return Err(AdminError::InvalidInput("No fields to update".into()));
    }
    Ok(fields)
}

fn note_failure(failure: &mut Option<StoreError>, uid: &str, step: &str, e: StoreError) {
    error!(uid, step, error = %e, "user deletion step failed");
    failure.get_or_insert(e);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryIdentity, MemoryStore};
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    fn seeded() -> (Arc<MemoryStore>, Arc<MemoryIdentity>, AdminService) {
        let store = Arc::new(MemoryStore::new());
        store.insert("users", "u1", fields(json!({"name": "Ada", "role": "user"})));
        store.insert("users", "u2", fields(json!({"name": "Bob", "points": 3})));
        store.insert("users/u1/history", "n1", fields(json!({"text": "so happy"})));
        store.insert("users/u1/history", "n2", fields(json!({"text": "so sad"})));
        store.insert("users/u2/history", "n3", fields(json!({"text": "meh"})));
        store.insert("history", "g1", fields(json!({"uid": "u1"})));
        store.insert("history", "g2", fields(json!({"uid": "u2"})));
        store.insert("history", "g3", fields(json!({"uid": "u1"})));
        let identity = Arc::new(MemoryIdentity::with_accounts(["u1", "u2"]));
        let service = AdminService::new(store.clone(), identity.clone());
        (store, identity, service)
    }

    #[tokio::test]
    async fn list_users_keeps_extra_fields() {
        let (_, _, service) = seeded();
        let users = service.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].uid, "u1");
        assert_eq!(users[0].name.as_deref(), Some("Ada"));
        assert_eq!(users[1].role, None);
        assert_eq!(users[1].extra["points"], 3);
    }

    #[tokio::test]
    async fn update_writes_only_supplied_fields() {
        let (store, _, service) = seeded();
        let update = UserUpdate {
            name: None,
            role: Some("admin".into()),
        };
        service.update_user("u1", &update).await.unwrap();
        assert_eq!(
            store.get("users", "u1").unwrap(),
            fields(json!({"name": "Ada", "role": "admin"}))
        );
    }

    #[tokio::test]
    async fn update_without_fields_is_invalid_and_writes_nothing() {
        let (store, _, service) = seeded();
        let update = UserUpdate {
            name: Some(String::new()),
            role: None,
        };
        let err = service.update_user("u1", &update).await;
        assert!(matches!(err, Err(AdminError::InvalidInput(msg)) if msg == "No fields to update"));
        assert_eq!(store.get("users", "u1").unwrap()["name"], "Ada");
    }

    #[tokio::test]
    async fn update_requires_uid() {
        let (_, _, service) = seeded();
        let update = UserUpdate {
            name: Some("X".into()),
            role: None,
        };
        assert!(matches!(
            service.update_user("  ", &update).await,
            Err(AdminError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn update_missing_user_is_store_error() {
        let (_, _, service) = seeded();
        let update = UserUpdate {
            name: Some("X".into()),
            role: None,
        };
        assert!(matches!(
            service.update_user("ghost", &update).await,
            Err(AdminError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn delete_removes_everything_for_the_user() {
        let (store, identity, service) = seeded();
        let outcome = service.delete_user("u1").await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome {
                deleted_history_entries: 4,
                identity_deleted: true
            }
        );
        assert!(store.is_empty("users/u1/history"));
        assert!(store.get("users", "u1").is_none());
        assert!(!identity.has_account("u1"));

        // Other users untouched.
        assert!(store.get("users", "u2").is_some());
        assert_eq!(store.len("users/u2/history"), 1);
        assert!(store.get("history", "g2").is_some());
        assert!(identity.has_account("u2"));
    }

    #[tokio::test]
    async fn delete_without_auth_account_still_succeeds() {
        let (store, _, _) = seeded();
        let identity = Arc::new(MemoryIdentity::new());
        let service = AdminService::new(store.clone(), identity);
        let outcome = service.delete_user("u1").await.unwrap();
        assert!(!outcome.identity_deleted);
        assert!(store.get("users", "u1").is_none());
    }

    #[tokio::test]
    async fn delete_attempts_every_step_after_a_failure() {
        let (store, identity, service) = seeded();
        store.fail_deletes_in("users/u1/history");

        let err = service.delete_user("u1").await;
        assert!(matches!(err, Err(AdminError::Store(StoreError::Server { .. }))));

        // Global history, user document and account were still removed.
        assert!(store.get("history", "g1").is_none());
        assert!(store.get("history", "g3").is_none());
        assert!(store.get("users", "u1").is_none());
        assert_eq!(identity.delete_log(), ["u1"]);
        assert!(store.delete_log().contains(&"users/u1".to_string()));
    }

    #[tokio::test]
    async fn nested_list_failure_still_runs_later_steps() {
        let (store, identity, service) = seeded();
        store.fail_lists_in("users/u1/history");

        let err = service.delete_user("u1").await;
        assert!(matches!(err, Err(AdminError::Store(StoreError::Server { .. }))));

        // Nested entries stay; everything after the listing still ran.
        assert_eq!(store.len("users/u1/history"), 2);
        assert!(store.get("history", "g1").is_none());
        assert!(store.get("history", "g3").is_none());
        assert!(store.get("users", "u1").is_none());
        assert!(!identity.has_account("u1"));
    }

    #[tokio::test]
    async fn global_query_failure_still_runs_later_steps() {
        let (store, identity, service) = seeded();
        store.fail_queries_in("history");

        let err = service.delete_user("u1").await;
        assert!(matches!(err, Err(AdminError::Store(StoreError::Server { .. }))));

        assert!(store.is_empty("users/u1/history"));
        assert!(store.get("history", "g1").is_some());
        assert!(store.get("users", "u1").is_none());
        assert!(!identity.has_account("u1"));
    }

    #[tokio::test]
    async fn user_document_failure_still_removes_account() {
        let (store, identity, service) = seeded();
        store.fail_deletes_in("users");

        let err = service.delete_user("u1").await;
        assert!(matches!(err, Err(AdminError::Store(StoreError::Server { .. }))));

        assert!(store.is_empty("users/u1/history"));
        assert!(store.get("history", "g1").is_none());
        assert!(store.get("users", "u1").is_some());
        assert_eq!(identity.delete_log(), ["u1"]);
        assert!(!identity.has_account("u1"));
    }

    #[tokio::test]
    async fn identity_outage_is_logged_not_returned() {
        let (store, identity, service) = seeded();
        identity.set_unavailable(true);

        let outcome = service.delete_user("u1").await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome {
                deleted_history_entries: 4,
                identity_deleted: false
            }
        );
        assert!(store.get("users", "u1").is_none());
        assert!(identity.has_account("u1"));
        assert_eq!(identity.delete_log(), ["u1"]);
    }

    #[tokio::test]
    async fn first_store_error_wins() {
        let (store, _, service) = seeded();
        store.fail_lists_in("users/u1/history");
        store.fail_deletes_in("users");

        match service.delete_user("u1").await {
            Err(AdminError::Store(StoreError::Server { body, .. })) => {
                assert!(body.contains("List"), "{body}");
            }
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[test]
    fn uid_validation() {
        assert_eq!(validate_uid("  u1 ").unwrap(), "u1");
        for bad in ["", "   ", "a/b", "..", ".", "u1/history/n1"] {
            assert!(
                matches!(validate_uid(bad), Err(AdminError::InvalidInput(_))),
                "{bad:?}"
            );
        }
        // Characters with URL meaning are left to the store to encode.
        assert_eq!(validate_uid("x?y#z").unwrap(), "x?y#z");
    }

    #[tokio::test]
    async fn path_like_uid_touches_nothing() {
        let (store, identity, service) = seeded();
        assert!(matches!(
            service.delete_user("u1/history/n1").await,
            Err(AdminError::InvalidInput(_))
        ));
        let update = UserUpdate {
            name: Some("X".into()),
            role: None,
        };
        assert!(matches!(
            service.update_user("../users/u2", &update).await,
            Err(AdminError::InvalidInput(_))
        ));
        assert!(store.delete_log().is_empty());
        assert!(identity.delete_log().is_empty());
        assert_eq!(store.get("users", "u2").unwrap()["name"], "Bob");
    }

    #[tokio::test]
    async fn delete_requires_uid() {
        let (store, identity, service) = seeded();
        assert!(matches!(
            service.delete_user("").await,
            Err(AdminError::InvalidInput(_))
        ));
        assert!(store.delete_log().is_empty());
        assert!(identity.delete_log().is_empty());
    }

    #[tokio::test]
    async fn custom_layout() {
        let store = Arc::new(MemoryStore::new());
        store.insert("people", "u1", fields(json!({})));
        store.insert("people/u1/entries", "e1", fields(json!({})));
        store.insert("log", "l1", fields(json!({"owner": "u1"})));
        let layout = CollectionLayout {
            users: "people".into(),
            nested_history: "entries".into(),
            global_history: "log".into(),
            owner_field: "owner".into(),
        };
        let service =
            AdminService::with_layout(store.clone(), Arc::new(MemoryIdentity::new()), layout);
        let outcome = service.delete_user("u1").await.unwrap();
        assert_eq!(outcome.deleted_history_entries, 2);
        assert!(store.is_empty("log"));
    }
}
