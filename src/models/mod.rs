// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.
//!
//! Each model serializes to the document shape stored in its collection.

pub mod list;
pub mod post;
pub mod user;

pub use list::{ListPatch, NewList, TodoList};
pub use post::{ActivityType, ImageRef, NewPost, Post, PostPatch};
pub use user::User;

use crate::db::Document;
use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};

/// Serialize a model into a store document.
pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<Document, AppError> {
    match serde_json::to_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize document: {}", e)))?
    {
        serde_json::Value::Object(doc) => Ok(doc),
        _ => Err(AppError::Internal(anyhow::anyhow!(
            "Model did not serialize to an object"
        ))),
    }
}

/// Deserialize a store document into a model.
pub(crate) fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, AppError> {
    serde_json::from_value(serde_json::Value::Object(doc))
        .map_err(|e| AppError::Database(format!("Malformed stored document: {}", e)))
}
