// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current-user routes (require authentication).

use super::form::UploadForm;
use crate::db::DocumentId;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ImageRef, User};
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_DISPLAY_NAME_CHARS: usize = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/profile", put(update_profile))
}

/// Current user response. Never carries the password hash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub email: String,
    pub display_name: Option<String>,
    pub profile_image: Option<ImageRef>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            profile_image: user.profile_image,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub public_id: String,
    pub url: String,
    pub user_id: DocumentId,
    pub display_name: Option<String>,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .users
        .get(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile.into()))
}

/// Replace the caller's profile picture and, optionally, display name.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>> {
    let UploadForm { image, fields } = UploadForm::read(multipart, "image").await?;
    let Some(upload) = image else {
        return Err(AppError::missing_fields(&["image"]));
    };

    let display_name = fields
        .get("displayName")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    if let Some(name) = &display_name {
        if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(AppError::BadRequest(format!(
                "displayName must be at most {} characters",
                MAX_DISPLAY_NAME_CHARS
            )));
        }
    }

    let image = state.users.upload_image(upload).await?;
    let updated = state
        .users
        .update_profile(&user.user_id, image, display_name)
        .await?;

    // update_profile always sets the new image
    let image = updated
        .profile_image
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Profile image missing after update")))?;

    Ok(Json(ProfileResponse {
        public_id: image.public_id,
        url: image.url,
        user_id: updated.id,
        display_name: updated.display_name,
    }))
}
