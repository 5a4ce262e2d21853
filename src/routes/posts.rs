// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity post routes (require authentication).

use super::form::UploadForm;
use super::{path_id, MessageResponse};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityType, NewPost, Post, PostPatch};
use crate::validation::require_fields;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Parts a post-creation form must carry, in reporting order.
const POST_FIELDS: [&str; 5] = ["image", "description", "duration", "distance", "activityType"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", get(get_posts).post(create_post))
        .route("/posts/{post_id}", patch(update_post).delete(delete_post))
}

/// Text parts of a post-creation form. `duration` and `distance` arrive as
/// JSON-encoded strings.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostForm {
    description: String,
    duration: String,
    distance: String,
    activity_type: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PostCreatedResponse {
    pub message: String,
    pub post: Post,
}

fn parse_json_part<T: DeserializeOwned>(name: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| AppError::BadRequest(format!("Invalid {}: {}", name, e)))
}

async fn get_posts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Post>>> {
    Ok(Json(state.posts.list(&user.user_id).await?))
}

/// Create a post from a multipart form.
///
/// Every part is checked before the image goes to the media service, so a
/// rejected request leaves nothing behind.
async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostCreatedResponse>)> {
    let UploadForm { image, fields } = UploadForm::read(multipart, "image").await?;
    let form: PostForm = require_fields(&POST_FIELDS, Value::Object(fields))?;
    let Some(upload) = image else {
        return Err(AppError::missing_fields(&["image"]));
    };

    let duration = parse_json_part("duration", &form.duration)?;
    let distance = parse_json_part("distance", &form.distance)?;
    let activity_type: ActivityType = form.activity_type.parse().map_err(AppError::BadRequest)?;

    let image = state.posts.upload_image(upload).await?;
    let post = state
        .posts
        .create(
            &user.user_id,
            NewPost {
                description: form.description,
                duration,
                distance,
                activity_type,
                image: Some(image),
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostCreatedResponse {
            message: "Post created successfully".to_string(),
            post,
        }),
    ))
}

async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<MessageResponse>> {
    let post_id = path_id(&post_id, "Post")?;
    let patch: PostPatch = require_fields(&[], body)?;

    state.posts.update(&user.user_id, &post_id, patch).await?;
    Ok(MessageResponse::new("Post updated successfully"))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let post_id = path_id(&post_id, "Post")?;

    state.posts.delete(&user.user_id, &post_id).await?;
    Ok(MessageResponse::new("Post deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::{Distance, Duration};

    #[test]
    fn test_parse_json_parts() {
        let duration: Duration = parse_json_part("duration", r#"{"hour":1,"min":5}"#).unwrap();
        assert_eq!(duration, Duration { hour: 1, min: 5 });

        let err = parse_json_part::<Distance>("distance", "12km").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.starts_with("Invalid distance")));
    }
}
