// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! To-do list routes (require authentication).

use super::{path_id, MessageResponse};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ListPatch, NewList, TodoList};
use crate::validation::require_fields;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

/// Fields a new list item must carry, in reporting order.
const LIST_FIELDS: [&str; 3] = ["title", "todoItem", "dateTime"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/lists", get(get_lists).post(create_list))
        .route("/lists/{list_id}", patch(update_list).delete(delete_list))
}

/// The caller's list items.
async fn get_lists(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TodoList>>> {
    Ok(Json(state.lists.list(&user.user_id).await?))
}

/// Create a list item owned by the caller. Any `userId` in the body is
/// ignored.
async fn create_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<Json<TodoList>> {
    let input: NewList = require_fields(&LIST_FIELDS, body)?;
    Ok(Json(state.lists.create(&user.user_id, input).await?))
}

async fn update_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(list_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<MessageResponse>> {
    let list_id = path_id(&list_id, "List")?;
    let patch: ListPatch = require_fields(&[], body)?;

    state.lists.update(&user.user_id, &list_id, patch).await?;
    Ok(MessageResponse::new("List updated successfully"))
}

async fn delete_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(list_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let list_id = path_id(&list_id, "List")?;

    state.lists.delete(&user.user_id, &list_id).await?;
    Ok(MessageResponse::new("List deleted successfully"))
}
