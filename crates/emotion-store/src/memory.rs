//! In-memory store and identity provider for tests and local runs.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{Document, DocumentStore, IdentityError, IdentityProvider, StoreError};

type Collection = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    List,
    Query,
    Delete,
}

/// A [`DocumentStore`] backed by nested maps. Documents list in id order.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Collection>>,
    failing: Mutex<HashSet<(Op, String)>>,
    deletes: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        lock(&self.collections)
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }

    pub fn len(&self, collection: &str) -> usize {
        lock(&self.collections).get(collection).map_or(0, |c| c.len())
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Make every delete in `collection` fail with a server error.
    pub fn fail_deletes_in(&self, collection: &str) {
        self.fail(Op::Delete, collection);
    }

    /// Make listing `collection` fail with a server error.
    pub fn fail_lists_in(&self, collection: &str) {
        self.fail(Op::List, collection);
    }

    /// Make field queries against `collection` fail with a server error.
    pub fn fail_queries_in(&self, collection: &str) {
        self.fail(Op::Query, collection);
    }

    fn fail(&self, op: Op, collection: &str) {
        lock(&self.failing).insert((op, collection.to_string()));
    }

    fn check(&self, op: Op, collection: &str) -> Result<(), StoreError> {
        if lock(&self.failing).contains(&(op, collection.to_string())) {
            return Err(StoreError::Server {
                status: 503,
                body: format!("injected {op:?} failure in {collection}"),
            });
        }
        Ok(())
    }

    fn documents(&self, collection: &str) -> Vec<Document> {
        lock(&self.collections)
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `collection/id` of every attempted delete, in call order.
    pub fn delete_log(&self) -> Vec<String> {
        lock(&self.deletes).clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.check(Op::List, collection)?;
        Ok(self.documents(collection))
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        self.check(Op::Query, collection)?;
        Ok(self
            .documents(collection)
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .collect())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = lock(&self.collections);
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        for (k, v) in fields {
            doc.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        lock(&self.deletes).push(format!("{collection}/{id}"));
        self.check(Op::Delete, collection)?;
        if let Some(c) = lock(&self.collections).get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }
}

/// An [`IdentityProvider`] holding a set of account uids.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<BTreeSet<String>>,
    deleted: Mutex<Vec<String>>,
    unavailable: Mutex<bool>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts<'a>(uids: impl IntoIterator<Item = &'a str>) -> Self {
        let identity = Self::default();
        lock(&identity.accounts).extend(uids.into_iter().map(str::to_string));
        identity
    }

    /// Make every delete fail with a server error, as during an outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }

    pub fn has_account(&self, uid: &str) -> bool {
        lock(&self.accounts).contains(uid)
    }

    /// Uids of every attempted delete, in call order.
    pub fn delete_log(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError> {
        lock(&self.deleted).push(uid.to_string());
        if *lock(&self.unavailable) {
            return Err(IdentityError::Server {
                status: 503,
                body: "identity provider unavailable".into(),
            });
        }
        if lock(&self.accounts).remove(uid) {
            Ok(())
        } else {
            Err(IdentityError::UserNotFound(uid.to_string()))
        }
    }
}

/// Recover the guard from a poisoned lock.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
