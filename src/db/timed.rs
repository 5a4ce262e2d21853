// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deadline wrapper for any [`DocumentStore`].

use super::{Document, DocumentId, DocumentStore, Filter, UpdateOutcome};
use crate::error::AppError;
use crate::time_utils::bounded;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Bounds every store call; a timeout is reported as a database failure.
pub struct TimedStore {
    inner: Arc<dyn DocumentStore>,
    limit: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn DocumentStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl DocumentStore for TimedStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, AppError> {
        bounded(
            self.limit,
            "store find",
            self.inner.find(collection, filter),
            AppError::Database,
        )
        .await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, AppError> {
        bounded(
            self.limit,
            "store find_one",
            self.inner.find_one(collection, filter),
            AppError::Database,
        )
        .await
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<DocumentId, AppError> {
        bounded(
            self.limit,
            "store insert_one",
            self.inner.insert_one(collection, doc),
            AppError::Database,
        )
        .await
    }

    async fn insert_unique(
        &self,
        collection: &str,
        key: &str,
        doc: Document,
    ) -> Result<bool, AppError> {
        bounded(
            self.limit,
            "store insert_unique",
            self.inner.insert_unique(collection, key, doc),
            AppError::Database,
        )
        .await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<UpdateOutcome, AppError> {
        bounded(
            self.limit,
            "store update_one",
            self.inner.update_one(collection, filter, patch),
            AppError::Database,
        )
        .await
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, AppError> {
        bounded(
            self.limit,
            "store delete_one",
            self.inner.delete_one(collection, filter),
            AppError::Database,
        )
        .await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}
