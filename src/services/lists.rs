// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owner-scoped CRUD for to-do list items.
//!
//! Every lookup filters by both the item id and the caller's id, so a list
//! owned by someone else is indistinguishable from one that does not exist.

use crate::db::{collections, Document, DocumentId, DocumentStore, Filter, OWNER_FIELD};
use crate::error::AppError;
use crate::models::{from_document, to_document, ListPatch, NewList, TodoList};
use std::sync::Arc;

#[derive(Clone)]
pub struct ListService {
    store: Arc<dyn DocumentStore>,
}

impl ListService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All list items owned by `owner`, in store order.
    pub async fn list(&self, owner: &DocumentId) -> Result<Vec<TodoList>, AppError> {
        self.store
            .find(collections::LISTS, &Filter::owner(owner))
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Create a list item owned by `owner`.
    pub async fn create(&self, owner: &DocumentId, input: NewList) -> Result<TodoList, AppError> {
        let mut doc = Document::new();
        doc.insert(OWNER_FIELD.to_string(), owner.as_str().into());
        doc.insert("title".to_string(), input.title.clone().into());
        doc.insert("todoItem".to_string(), input.todo_item.clone().into());
        doc.insert("dateTime".to_string(), input.date_time.clone().into());

        let id = self.store.insert_one(collections::LISTS, doc).await?;

        tracing::info!(user_id = %owner, list_id = %id, "List created");

        Ok(TodoList {
            id,
            user_id: owner.clone(),
            title: input.title,
            todo_item: input.todo_item,
            date_time: input.date_time,
        })
    }

    /// Apply the provided fields of `patch` to the caller's list item.
    ///
    /// Fails with `NotFound` when the item does not exist or belongs to
    /// someone else, and with `NotModified` when nothing would change.
    pub async fn update(
        &self,
        owner: &DocumentId,
        list_id: &DocumentId,
        patch: ListPatch,
    ) -> Result<(), AppError> {
        let filter = Filter::owned(list_id, owner);

        if self.store.find_one(collections::LISTS, &filter).await?.is_none() {
            return Err(AppError::NotFound(format!("List {} not found", list_id)));
        }

        if patch.is_empty() {
            return Err(AppError::NotModified);
        }

        let outcome = self
            .store
            .update_one(collections::LISTS, &filter, to_document(&patch)?)
            .await?;

        // Deleted between the lookup and the update
        if outcome.matched == 0 {
            return Err(AppError::NotFound(format!("List {} not found", list_id)));
        }
        if outcome.modified == 0 {
            return Err(AppError::NotModified);
        }

        tracing::info!(user_id = %owner, list_id = %list_id, "List updated");
        Ok(())
    }

    /// Delete the caller's list item.
    pub async fn delete(&self, owner: &DocumentId, list_id: &DocumentId) -> Result<(), AppError> {
        let deleted = self
            .store
            .delete_one(collections::LISTS, &Filter::owned(list_id, owner))
            .await?;

        if deleted == 0 {
            return Err(AppError::NotFound(format!("List {} not found", list_id)));
        }

        tracing::info!(user_id = %owner, list_id = %list_id, "List deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn user(tag: char) -> DocumentId {
        DocumentId::parse(&tag.to_string().repeat(20)).unwrap()
    }

    fn new_list() -> NewList {
        NewList {
            title: "A".to_string(),
            todo_item: "B".to_string(),
            date_time: "2024-01-01".to_string(),
        }
    }

    fn service() -> ListService {
        ListService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_sets_owner_from_caller() {
        let service = service();
        let owner = user('a');

        let created = service.create(&owner, new_list()).await.unwrap();
        assert_eq!(created.user_id, owner);

        let lists = service.list(&owner).await.unwrap();
        assert_eq!(lists, vec![created]);
        assert!(service.list(&user('b')).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cross_user_access_is_not_found() {
        let service = service();
        let created = service.create(&user('a'), new_list()).await.unwrap();
        let intruder = user('b');

        let patch = ListPatch {
            title: Some("hijacked".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&intruder, &created.id, patch).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&intruder, &created.id).await,
            Err(AppError::NotFound(_))
        ));

        let lists = service.list(&user('a')).await.unwrap();
        assert_eq!(lists[0].title, "A");
    }

    #[tokio::test]
    async fn test_empty_patch_is_not_modified() {
        let service = service();
        let owner = user('a');
        let created = service.create(&owner, new_list()).await.unwrap();

        let result = service.update(&owner, &created.id, ListPatch::default()).await;
        assert!(matches!(result, Err(AppError::NotModified)));
        assert_eq!(service.list(&owner).await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_redundant_patch_is_not_modified() {
        let service = service();
        let owner = user('a');
        let created = service.create(&owner, new_list()).await.unwrap();

        let patch = ListPatch {
            title: Some("A".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&owner, &created.id, patch).await,
            Err(AppError::NotModified)
        ));
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let service = service();
        let owner = user('a');
        let created = service.create(&owner, new_list()).await.unwrap();

        let patch = ListPatch {
            todo_item: Some("C".to_string()),
            ..Default::default()
        };
        service.update(&owner, &created.id, patch).await.unwrap();

        let updated = &service.list(&owner).await.unwrap()[0];
        assert_eq!(updated.todo_item, "C");
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.date_time, created.date_time);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let service = service();
        let owner = user('a');
        let created = service.create(&owner, new_list()).await.unwrap();

        service.delete(&owner, &created.id).await.unwrap();
        assert!(matches!(
            service.delete(&owner, &created.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
