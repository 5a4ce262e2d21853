// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image storage.
//!
//! Uploads go to Cloudinary in production and return a stable
//! [`ImageRef`]; deletion is keyed by the reference's `public_id`.

use crate::config::CloudinaryConfig;
use crate::error::AppError;
use crate::models::ImageRef;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Folder for post images.
pub const POSTS_FOLDER: &str = "posts";
/// Folder for profile pictures.
pub const PROFILES_FOLDER: &str = "profiles";

/// Binary object storage returning durable references.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `bytes` under `folder`.
    async fn upload(&self, bytes: Vec<u8>, mime_type: &str, folder: &str)
        -> Result<ImageRef, AppError>;

    /// Delete a stored object. Deleting an unknown id is not an error.
    async fn destroy(&self, public_id: &str) -> Result<(), AppError>;
}

// ─── Cloudinary ──────────────────────────────────────────────

/// Cloudinary upload API client.
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: format!("https://api.cloudinary.com/v1_1/{}", config.cloud_name),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Sign request parameters: sorted `k=v` pairs joined by `&`, followed
    /// by the API secret, hashed with SHA-256.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        hex::encode(Sha256::digest(format!("{}{}", to_sign, self.api_secret)))
    }

    fn timestamp() -> Result<String, AppError> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(e.into()))?
            .as_secs()
            .to_string())
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Media(format!("Cloudinary returned {}: {}", status, body)))
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        folder: &str,
    ) -> Result<ImageRef, AppError> {
        let timestamp = Self::timestamp()?;
        let signature = self.sign(&[("folder", folder), ("timestamp", &timestamp)]);

        let file = reqwest::multipart::Part::bytes(bytes)
            .file_name("upload")
            .mime_str(mime_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("folder", folder.to_string())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .http
            .post(format!("{}/image/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Media(e.to_string()))?;

        let uploaded: UploadResponse = Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Media(format!("Malformed upload response: {}", e)))?;

        tracing::info!(public_id = %uploaded.public_id, "Image uploaded");

        Ok(ImageRef {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        let timestamp = Self::timestamp()?;
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let params = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .http
            .post(format!("{}/image/destroy", self.base_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Media(e.to_string()))?;

        let outcome: DestroyResponse = Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Media(format!("Malformed destroy response: {}", e)))?;

        match outcome.result.as_str() {
            "ok" | "not found" => {
                tracing::info!(public_id, result = %outcome.result, "Image destroyed");
                Ok(())
            }
            other => Err(AppError::Media(format!("Unexpected destroy result: {}", other))),
        }
    }
}

// ─── In-memory ───────────────────────────────────────────────

/// Media store kept in process memory, for tests and local runs.
#[derive(Clone, Default)]
pub struct MemoryMedia {
    objects: Arc<DashMap<String, String>>,
    failing: Arc<AtomicBool>,
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (simulates an outage).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.objects.contains_key(public_id)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Media("Media service unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaStore for MemoryMedia {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        mime_type: &str,
        folder: &str,
    ) -> Result<ImageRef, AppError> {
        self.check_available()?;

        let public_id = format!("{}/{}", folder, crate::db::DocumentId::generate()?);
        let url = format!("memory://{}", public_id);
        self.objects.insert(public_id.clone(), mime_type.to_string());

        Ok(ImageRef { public_id, url })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        self.check_available()?;
        self.objects.remove(public_id);
        Ok(())
    }
}

// ─── Timeout wrapper ─────────────────────────────────────────

/// Bounds every call of the wrapped store; a timeout is reported as a
/// media failure.
pub struct TimedMedia {
    inner: Arc<dyn MediaStore>,
    limit: Duration,
}

impl TimedMedia {
    pub fn new(inner: Arc<dyn MediaStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl MediaStore for TimedMedia {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        folder: &str,
    ) -> Result<ImageRef, AppError> {
        crate::time_utils::bounded(
            self.limit,
            "media upload",
            self.inner.upload(bytes, mime_type, folder),
            AppError::Media,
        )
        .await
    }

    async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        crate::time_utils::bounded(
            self.limit,
            "media destroy",
            self.inner.destroy(public_id),
            AppError::Media,
        )
        .await
    }
}
