// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers and services talk to a [`DocumentStore`]: a collection-oriented
//! store addressed by generated identifiers and queried by equality filters.
//! Firestore backs it in production; [`MemoryStore`] backs tests and local runs.

pub mod firestore;
pub mod memory;
pub mod timed;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;
pub use timed::TimedStore;

use crate::error::AppError;
use async_trait::async_trait;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const LISTS: &str = "lists";
    pub const POSTS: &str = "posts";
    /// One marker per registered email, keyed by [`super::unique_key`]
    pub const EMAILS: &str = "emails";
}

/// Field holding a document's own identifier.
pub const ID_FIELD: &str = "_id";

/// A stored document: a JSON object whose `_id` field is its identifier.
pub type Document = serde_json::Map<String, serde_json::Value>;

const ID_LEN: usize = 20;
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Store-generated document identifier (20 alphanumeric characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Result<Self, AppError> {
        let rng = SystemRandom::new();
        let mut id = String::with_capacity(ID_LEN);
        let mut buf = [0u8; 32];

        while id.len() < ID_LEN {
            rng.fill(&mut buf)
                .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
            // Reject the top of the byte range so every character is equally likely
            for b in buf.iter().filter(|&&b| (b as usize) < 248) {
                if id.len() == ID_LEN {
                    break;
                }
                id.push(ID_ALPHABET[*b as usize % ID_ALPHABET.len()] as char);
            }
        }

        Ok(Self(id))
    }

    /// Parse an identifier, rejecting anything the store could not have generated.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == ID_LEN && raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("malformed document id: {value}"))
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Conjunction of `field == value` conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match documents whose `field` equals `value`.
    pub fn eq(mut self, field: &str, value: impl Into<String>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    /// Match a single document by identifier.
    pub fn by_id(id: &DocumentId) -> Self {
        Self::new().eq(ID_FIELD, id.as_str())
    }

    /// Match a document by identifier and owning user (owner-scoped query).
    pub fn owned(id: &DocumentId, owner: &DocumentId) -> Self {
        Self::by_id(id).eq(OWNER_FIELD, owner.as_str())
    }

    /// Match every document owned by `owner`.
    pub fn owner(owner: &DocumentId) -> Self {
        Self::new().eq(OWNER_FIELD, owner.as_str())
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    /// Whether `doc` satisfies every condition.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| doc.get(field).and_then(|v| v.as_str()) == Some(value.as_str()))
    }
}

/// Field linking owned resources to their user.
pub const OWNER_FIELD: &str = "userId";

/// Outcome of [`DocumentStore::update_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents matching the filter (0 or 1)
    pub matched: u64,
    /// Documents whose stored fields actually changed (0 or 1)
    pub modified: u64,
}

/// Store key derived from a natural key such as an email address: the hex
/// SHA-256 of `value`, so any input maps to a valid document id.
pub fn unique_key(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Apply `patch` to `doc`, returning whether any field changed.
pub(crate) fn apply_patch(doc: &mut Document, patch: &Document) -> bool {
    let mut changed = false;
    for (field, value) in patch {
        if field == ID_FIELD {
            continue;
        }
        if doc.get(field) != Some(value) {
            doc.insert(field.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

/// Collection-oriented document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching `filter`, in store order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, AppError>;

    /// First document matching `filter`.
    async fn find_one(&self, collection: &str, filter: &Filter)
        -> Result<Option<Document>, AppError>;

    /// Insert `doc` under a freshly generated identifier.
    async fn insert_one(&self, collection: &str, doc: Document) -> Result<DocumentId, AppError>;

    /// Insert `doc` under the caller-chosen `key`, atomically. Returns
    /// `false` and writes nothing when `key` is already taken.
    async fn insert_unique(
        &self,
        collection: &str,
        key: &str,
        doc: Document,
    ) -> Result<bool, AppError>;

    /// Set the fields of `patch` on the first document matching `filter`.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<UpdateOutcome, AppError>;

    /// Delete the first document matching `filter`; returns the number deleted.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, AppError>;

    /// Release the connection. Called once at shutdown.
    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_ids_are_well_formed_and_distinct() {
        let a = DocumentId::generate().unwrap();
        let b = DocumentId::generate().unwrap();

        assert!(DocumentId::parse(a.as_str()).is_some());
        assert_eq!(a.as_str().len(), ID_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        assert!(DocumentId::parse("").is_none());
        assert!(DocumentId::parse("short").is_none());
        assert!(DocumentId::parse("abcdefghij-klmnopqrs").is_none());
        assert!(DocumentId::parse("abcdefghijklmnopqrstu").is_none());
        assert!(DocumentId::parse("abcdefghijklmnopqrst").is_some());
    }

    #[test]
    fn test_filter_matches_all_conditions() {
        let owner = DocumentId::parse("ownerownerownerowner").unwrap();
        let id = DocumentId::parse("docdocdocdocdocdocdo").unwrap();
        let doc = json!({ "_id": id.as_str(), "userId": owner.as_str(), "title": "A" });
        let doc = doc.as_object().unwrap();

        assert!(Filter::owned(&id, &owner).matches(doc));
        assert!(Filter::owner(&owner).matches(doc));

        let other = DocumentId::parse("otherotherotherother").unwrap();
        assert!(!Filter::owned(&id, &other).matches(doc));
    }

    #[test]
    fn test_unique_key_is_stable_hex() {
        let key = unique_key("a@example.com");
        assert_eq!(key, unique_key("a@example.com"));
        assert_ne!(key, unique_key("b@example.com"));
        assert_eq!(key.len(), 64);
        assert!(key.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_apply_patch_reports_changes() {
        let mut doc = json!({ "_id": "x", "title": "A", "todoItem": "B" })
            .as_object()
            .cloned()
            .unwrap();

        let same = json!({ "title": "A" }).as_object().cloned().unwrap();
        assert!(!apply_patch(&mut doc, &same));

        let changed = json!({ "title": "C", "_id": "y" }).as_object().cloned().unwrap();
        assert!(apply_patch(&mut doc, &changed));
        assert_eq!(doc["title"], "C");
        assert_eq!(doc["todoItem"], "B");
        assert_eq!(doc["_id"], "x");
    }
}
