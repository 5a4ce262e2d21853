// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User accounts: signup, credential checks and profile updates.

use crate::db::{collections, unique_key, Document, DocumentId, DocumentStore, Filter, ID_FIELD};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{from_document, ImageRef, User};
use crate::services::media::{MediaStore, PROFILES_FOLDER};
use crate::services::password::PasswordHasher;
use crate::services::posts::ImageUpload;
use crate::time_utils::now_rfc3339;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
    media: Arc<dyn MediaStore>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        media: Arc<dyn MediaStore>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            media,
            hasher,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.store
            .find_one(collections::USERS, &Filter::new().eq("email", email))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Look up a user by id.
    pub async fn get(&self, user_id: &DocumentId) -> Result<Option<User>, AppError> {
        self.store
            .find_one(collections::USERS, &Filter::by_id(user_id))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Create an account. Fails before any user write if the email is taken.
    ///
    /// The email is claimed with an atomic unique insert before hashing, so
    /// of several concurrent signups for one address exactly one succeeds.
    pub async fn signup(
        &self,
        email: &str,
        password: String,
        display_name: Option<String>,
    ) -> Result<User, AppError> {
        let email = normalize_email(email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let claim_key = unique_key(&email);
        let mut claim = Document::new();
        claim.insert("email".to_string(), email.clone().into());
        if !self
            .store
            .insert_unique(collections::EMAILS, &claim_key, claim)
            .await?
        {
            return Err(email_taken());
        }

        match self.create_user(email, password, display_name).await {
            Ok(user) => Ok(user),
            Err(err) => {
                self.release_claim(&claim_key).await;
                Err(err)
            }
        }
    }

    async fn create_user(
        &self,
        email: String,
        password: String,
        display_name: Option<String>,
    ) -> Result<User, AppError> {
        let password = self.hasher.hash_async(password).await?;
        let created_at = now_rfc3339();

        let mut doc = Document::new();
        doc.insert("email".to_string(), email.clone().into());
        doc.insert("password".to_string(), password.clone().into());
        if let Some(name) = &display_name {
            doc.insert("displayName".to_string(), name.clone().into());
        }
        doc.insert("createdAt".to_string(), created_at.clone().into());

        let id = self.store.insert_one(collections::USERS, doc).await?;
        tracing::info!(user_id = %id, "User signed up");

        Ok(User {
            id,
            email,
            password,
            display_name,
            profile_image: None,
            created_at,
        })
    }

    async fn release_claim(&self, claim_key: &str) {
        let filter = Filter::new().eq(ID_FIELD, claim_key);
        if let Err(e) = self.store.delete_one(collections::EMAILS, &filter).await {
            tracing::warn!(error = %e, "Failed to release email claim after failed signup");
        }
    }

    /// Check an email/password pair.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn authenticate(&self, email: &str, password: String) -> Result<User, AppError> {
        let email = normalize_email(email);

        let Some(user) = self.find_by_email(&email).await? else {
            tracing::info!("Signin rejected: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify_async(password, user.password.clone())
            .await?
        {
            tracing::info!(user_id = %user.id, "Signin rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Push a new profile picture to the media service.
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<ImageRef, AppError> {
        self.media
            .upload(upload.bytes, &upload.mime_type, PROFILES_FOLDER)
            .await
    }

    /// Replace the caller's profile picture (already uploaded) and display name.
    ///
    /// The previous picture is removed best-effort afterwards. If the user no
    /// longer exists the new upload is discarded.
    pub async fn update_profile(
        &self,
        user_id: &DocumentId,
        image: ImageRef,
        display_name: Option<String>,
    ) -> Result<User, AppError> {
        let Some(mut user) = self.get(user_id).await? else {
            self.discard_image(&image.public_id).await;
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        };

        let mut patch = Document::new();
        patch.insert(
            "profileImage".to_string(),
            serde_json::to_value(&image).map_err(|e| AppError::Internal(e.into()))?,
        );
        if let Some(name) = &display_name {
            patch.insert("displayName".to_string(), name.clone().into());
        }

        let outcome = self
            .store
            .update_one(collections::USERS, &Filter::by_id(user_id), patch)
            .await?;
        if outcome.matched == 0 {
            self.discard_image(&image.public_id).await;
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        if let Some(previous) = user.profile_image.take() {
            if previous.public_id != image.public_id {
                self.discard_image(&previous.public_id).await;
            }
        }

        tracing::info!(user_id = %user_id, "Profile updated");

        user.profile_image = Some(image);
        if display_name.is_some() {
            user.display_name = display_name;
        }
        Ok(user)
    }

    async fn discard_image(&self, public_id: &str) {
        if let Err(e) = self.media.destroy(public_id).await {
            tracing::warn!(public_id, error = %e, "Failed to destroy profile image");
        }
    }
}

fn email_taken() -> AppError {
    tracing::info!("Signup rejected: email already registered");
    AppError::BadRequest("Email already exists".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, UpdateOutcome};
    use crate::services::media::MemoryMedia;
    use async_trait::async_trait;

    fn setup() -> (UserService, MemoryStore, MemoryMedia) {
        let store = MemoryStore::new();
        let media = MemoryMedia::new();
        let service = UserService::new(
            Arc::new(store.clone()),
            Arc::new(media.clone()),
            PasswordHasher::new(1_000),
        );
        (service, store, media)
    }

    #[tokio::test]
    async fn test_signup_then_authenticate() {
        let (service, _, _) = setup();
        let user = service
            .signup(" Runner@Example.com ", "hunter22".to_string(), None)
            .await
            .unwrap();

        assert_eq!(user.email, "runner@example.com");
        assert_ne!(user.password, "hunter22");

        let signed_in = service
            .authenticate("runner@example.com", "hunter22".to_string())
            .await
            .unwrap();
        assert_eq!(signed_in.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_signup_writes_nothing() {
        let (service, store, _) = setup();
        service
            .signup("a@example.com", "password1".to_string(), None)
            .await
            .unwrap();

        let err = service
            .signup("A@example.com", "password2".to_string(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(store.count(collections::USERS), 1);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let (service, _, _) = setup();
        service
            .signup("a@example.com", "password1".to_string(), None)
            .await
            .unwrap();

        for (email, password) in [("a@example.com", "nope"), ("b@example.com", "password1")] {
            let err = service
                .authenticate(email, password.to_string())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn test_update_profile_replaces_previous_image() {
        let (service, _, media) = setup();
        let user = service
            .signup("a@example.com", "password1".to_string(), None)
            .await
            .unwrap();

        let first = media.upload(vec![1], "image/png", PROFILES_FOLDER).await.unwrap();
        service
            .update_profile(&user.id, first.clone(), Some("Ann".to_string()))
            .await
            .unwrap();

        let second = media.upload(vec![2], "image/png", PROFILES_FOLDER).await.unwrap();
        let updated = service
            .update_profile(&user.id, second.clone(), None)
            .await
            .unwrap();

        assert_eq!(updated.display_name.as_deref(), Some("Ann"));
        assert_eq!(updated.profile_image, Some(second.clone()));
        assert!(!media.contains(&first.public_id));
        assert!(media.contains(&second.public_id));

        let stored = service.get(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.profile_image, Some(second));
    }

    #[tokio::test]
    async fn test_update_profile_for_missing_user_discards_upload() {
        let (service, _, media) = setup();
        let image = media.upload(vec![1], "image/png", PROFILES_FOLDER).await.unwrap();
        let ghost = DocumentId::generate().unwrap();

        let err = service.update_profile(&ghost, image.clone(), None).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!media.contains(&image.public_id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_signups_store_one_user() {
        let (service, store, _) = setup();

        let attempts: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .signup("race@example.com", format!("password{i}"), None)
                        .await
                })
            })
            .collect();

        let mut succeeded = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Email already exists"),
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(store.count(collections::USERS), 1);
        assert_eq!(store.count(collections::EMAILS), 1);
    }

    /// Store whose user documents disappear between lookup and update.
    struct VanishingStore(MemoryStore);

    #[async_trait]
    impl DocumentStore for VanishingStore {
        async fn find(&self, c: &str, f: &Filter) -> Result<Vec<Document>, AppError> {
            self.0.find(c, f).await
        }

        async fn find_one(&self, c: &str, f: &Filter) -> Result<Option<Document>, AppError> {
            self.0.find_one(c, f).await
        }

        async fn insert_one(&self, c: &str, doc: Document) -> Result<DocumentId, AppError> {
            self.0.insert_one(c, doc).await
        }

        async fn insert_unique(&self, c: &str, key: &str, doc: Document) -> Result<bool, AppError> {
            self.0.insert_unique(c, key, doc).await
        }

        async fn update_one(
            &self,
            c: &str,
            f: &Filter,
            _patch: Document,
        ) -> Result<UpdateOutcome, AppError> {
            self.0.delete_one(c, f).await?;
            Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            })
        }

        async fn delete_one(&self, c: &str, f: &Filter) -> Result<u64, AppError> {
            self.0.delete_one(c, f).await
        }
    }

    #[tokio::test]
    async fn test_update_profile_discards_upload_when_user_vanishes() {
        let media = MemoryMedia::new();
        let service = UserService::new(
            Arc::new(VanishingStore(MemoryStore::new())),
            Arc::new(media.clone()),
            PasswordHasher::new(1_000),
        );
        let user = service
            .signup("a@example.com", "password1".to_string(), None)
            .await
            .unwrap();
        let image = media.upload(vec![1], "image/png", PROFILES_FOLDER).await.unwrap();

        let err = service.update_profile(&user.id, image.clone(), None).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!media.contains(&image.public_id));
    }
}
