// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store for tests and local development.

use super::{apply_patch, Document, DocumentId, DocumentStore, Filter, UpdateOutcome, ID_FIELD};
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Document store held in memory, one insertion-ordered vector per collection.
///
/// Each operation holds the collection's shard lock for its whole duration,
/// so single-document writes are atomic like they are in Firestore.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut doc: Document,
    ) -> Result<DocumentId, AppError> {
        let id = DocumentId::generate()?;
        doc.insert(ID_FIELD.to_string(), id.as_str().into());

        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);

        Ok(id)
    }

    async fn insert_unique(
        &self,
        collection: &str,
        key: &str,
        mut doc: Document,
    ) -> Result<bool, AppError> {
        // The entry guard holds the shard lock across the check and the push
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs
            .iter()
            .any(|d| d.get(ID_FIELD).and_then(|v| v.as_str()) == Some(key))
        {
            return Ok(false);
        }

        doc.insert(ID_FIELD.to_string(), key.into());
        docs.push(doc);
        Ok(true)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            });
        };

        match docs.iter_mut().find(|d| filter.matches(d)) {
            Some(doc) => Ok(UpdateOutcome {
                matched: 1,
                modified: apply_patch(doc, &patch) as u64,
            }),
            None => Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            }),
        }
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, AppError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };

        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
