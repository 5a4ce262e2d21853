// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Multipart form decoding for image uploads.

use crate::error::AppError;
use crate::services::ImageUpload;
use axum::extract::multipart::{Multipart, MultipartError};
use serde_json::{Map, Value};

/// A decoded upload form: at most one image plus the text fields.
pub(crate) struct UploadForm {
    pub image: Option<ImageUpload>,
    /// Text fields keyed by part name, so they can go through the same
    /// required-field checks as JSON bodies.
    pub fields: Map<String, Value>,
}

impl UploadForm {
    /// Read every part of `multipart`. The part named `file_field` is the
    /// image; an empty file part counts as no image.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, AppError> {
        let mut image = None;
        let mut fields = Map::new();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == file_field {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                if bytes.is_empty() {
                    continue;
                }
                if !mime_type.starts_with("image/") {
                    return Err(AppError::BadRequest(format!(
                        "Unsupported image type: {}",
                        mime_type
                    )));
                }
                image = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    mime_type,
                });
            } else {
                let text = field.text().await.map_err(malformed)?;
                fields.insert(name, Value::String(text));
            }
        }

        // Lets callers list the image among the required fields
        if image.is_some() {
            fields.insert(file_field.to_string(), Value::Bool(true));
        }

        Ok(Self { image, fields })
    }
}

fn malformed(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", e.body_text()))
}
