// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owner-scoped CRUD for activity posts.
//!
//! A post always references an image held by the media service. Creation
//! uploads first and rolls the upload back if the insert fails; deletion
//! removes the document first and the image afterwards, so a partial failure
//! can only leave an orphaned image behind, never a post without its image.

use crate::db::{collections, DocumentId, DocumentStore, Filter};
use crate::error::AppError;
use crate::models::post::{Distance, Duration};
use crate::models::{from_document, to_document, ActivityType, ImageRef, NewPost, Post, PostPatch};
use crate::services::media::{MediaStore, POSTS_FOLDER};
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::sync::Arc;

/// Stored shape of a post before the store assigns its id.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDocument<'a> {
    user_id: &'a DocumentId,
    description: &'a str,
    duration: Duration,
    distance: Distance,
    activity_type: ActivityType,
    image: &'a ImageRef,
    created_at: &'a str,
}

/// Raw image bytes received with a request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn DocumentStore>,
    media: Arc<dyn MediaStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>, media: Arc<dyn MediaStore>) -> Self {
        Self { store, media }
    }

    /// All posts owned by `owner`.
    pub async fn list(&self, owner: &DocumentId) -> Result<Vec<Post>, AppError> {
        self.store
            .find(collections::POSTS, &Filter::owner(owner))
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Push an image to the media service for a new post.
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<ImageRef, AppError> {
        self.media
            .upload(upload.bytes, &upload.mime_type, POSTS_FOLDER)
            .await
    }

    /// Persist a post whose image has already been uploaded.
    ///
    /// Fails with a validation error, without touching the store, when the
    /// image reference is missing. If the insert fails the image is destroyed.
    pub async fn create(&self, owner: &DocumentId, input: NewPost) -> Result<Post, AppError> {
        let Some(image) = input.image else {
            return Err(AppError::missing_fields(&["image"]));
        };

        let created_at = now_rfc3339();
        let doc = to_document(&PostDocument {
            user_id: owner,
            description: &input.description,
            duration: input.duration,
            distance: input.distance,
            activity_type: input.activity_type,
            image: &image,
            created_at: &created_at,
        })?;

        let id = match self.store.insert_one(collections::POSTS, doc).await {
            Ok(id) => id,
            Err(err) => {
                self.discard_image(&image.public_id).await;
                return Err(err);
            }
        };

        let post = Post {
            id,
            user_id: owner.clone(),
            description: input.description,
            duration: input.duration,
            distance: input.distance,
            activity_type: input.activity_type,
            image,
            created_at,
        };

        tracing::info!(
            user_id = %owner,
            post_id = %post.id,
            activity_type = %post.activity_type,
            "Post created"
        );

        Ok(post)
    }

    /// Apply the provided fields of `patch` to the caller's post.
    pub async fn update(
        &self,
        owner: &DocumentId,
        post_id: &DocumentId,
        patch: PostPatch,
    ) -> Result<(), AppError> {
        let filter = Filter::owned(post_id, owner);

        if self.store.find_one(collections::POSTS, &filter).await?.is_none() {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }

        if patch.is_empty() {
            return Err(AppError::NotModified);
        }

        let outcome = self
            .store
            .update_one(collections::POSTS, &filter, to_document(&patch)?)
            .await?;

        if outcome.matched == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }
        if outcome.modified == 0 {
            return Err(AppError::NotModified);
        }

        tracing::info!(user_id = %owner, post_id = %post_id, "Post updated");
        Ok(())
    }

    /// Delete the caller's post, then its image.
    pub async fn delete(&self, owner: &DocumentId, post_id: &DocumentId) -> Result<(), AppError> {
        let filter = Filter::owned(post_id, owner);

        let post: Post = match self.store.find_one(collections::POSTS, &filter).await? {
            Some(doc) => from_document(doc)?,
            None => return Err(AppError::NotFound(format!("Post {} not found", post_id))),
        };

        if self.store.delete_one(collections::POSTS, &filter).await? == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }

        if !post.image.public_id.is_empty() {
            self.discard_image(&post.image.public_id).await;
        }

        tracing::info!(user_id = %owner, post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Best-effort image removal: failures are logged, not returned.
    async fn discard_image(&self, public_id: &str) {
        if let Err(e) = self.media.destroy(public_id).await {
            tracing::warn!(public_id, error = %e, "Failed to destroy image; left orphaned");
        }
    }
}
