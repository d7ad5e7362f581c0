//! Admin store adapter: user documents in Firestore, accounts in Firebase Auth.

mod admin;
mod credentials;
mod document;
mod error;
pub mod firestore;
pub mod identity;
pub mod memory;

pub use admin::{
    AdminError, AdminService, CollectionLayout, DeleteOutcome, update_fields, validate_uid,
};
pub use credentials::{CREDENTIALS_ENV, Credentials};
pub use document::{Document, DocumentStore};
pub use error::{CredentialsError, IdentityError, StoreError};
pub use firestore::FirestoreClient;
pub use identity::{FirebaseAuth, IdentityProvider};
