// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore implementation of [`DocumentStore`].
//!
//! Every document is stored under its generated identifier and also carries
//! that identifier in its `_id` field, so identifier lookups and equality
//! filters go through the same query path.

use super::{apply_patch, Document, DocumentId, DocumentStore, Filter, UpdateOutcome, ID_FIELD};
use crate::error::AppError;
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Run an equality query, returning at most `limit` documents.
    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<u32>,
    ) -> Result<Vec<Document>, AppError> {
        let conditions = filter.conditions().to_vec();

        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| {
                q.for_all(
                    conditions
                        .iter()
                        .map(|(field, value)| q.field(field.as_str()).eq(value.clone())),
                )
            });

        let query = match limit {
            Some(limit) => query.limit(limit),
            None => query,
        };

        query
            .obj::<Document>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Identifier of a document read back from Firestore.
fn stored_id(doc: &Document) -> Result<&str, AppError> {
    doc.get(ID_FIELD)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::Database("Stored document has no _id field".to_string()))
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, AppError> {
        self.query(collection, filter, None).await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, AppError> {
        Ok(self.query(collection, filter, Some(1)).await?.into_iter().next())
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut doc: Document,
    ) -> Result<DocumentId, AppError> {
        let id = DocumentId::generate()?;
        doc.insert(ID_FIELD.to_string(), id.as_str().into());

        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(id.as_str())
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(collection, id = %id, "Inserted document");
        Ok(id)
    }

    async fn insert_unique(
        &self,
        collection: &str,
        key: &str,
        mut doc: Document,
    ) -> Result<bool, AppError> {
        doc.insert(ID_FIELD.to_string(), key.into());

        // Firestore rejects a create on an existing document id
        let result: Result<(), _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(key)
            .object(&doc)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                tracing::debug!(collection, key, "Unique key already taken");
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let Some(mut doc) = self.find_one(collection, filter).await? else {
            return Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            });
        };

        let changed_fields: Vec<String> = patch
            .iter()
            .filter(|(field, value)| field.as_str() != ID_FIELD && doc.get(*field) != Some(value))
            .map(|(field, _)| field.clone())
            .collect();

        if !apply_patch(&mut doc, &patch) {
            return Ok(UpdateOutcome {
                matched: 1,
                modified: 0,
            });
        }

        let id = stored_id(&doc)?.to_string();

        // Only the changed fields go into the update mask, so concurrent
        // writes to other fields of the same document are not clobbered.
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(changed_fields)
            .in_col(collection)
            .document_id(&id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(UpdateOutcome {
            matched: 1,
            modified: 1,
        })
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, AppError> {
        let Some(doc) = self.find_one(collection, filter).await? else {
            return Ok(0);
        };
        let id = stored_id(&doc)?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(1)
    }

    async fn close(&self) {
        if self.client.is_some() {
            tracing::info!("Disconnected from Firestore");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::collections;

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db
            .find(collections::LISTS, &Filter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        // Closing an offline client is a no-op
        db.close().await;
    }
}
