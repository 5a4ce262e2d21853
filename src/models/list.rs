// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! To-do list item model for storage and API.

use crate::db::DocumentId;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A to-do item stored in the `lists` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TodoList {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Owning user
    pub user_id: DocumentId,
    pub title: String,
    /// Single task description
    pub todo_item: String,
    /// Due date/time as supplied by the client
    pub date_time: String,
}

/// Fields accepted when creating a list item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    pub title: String,
    pub todo_item: String,
    pub date_time: String,
}

/// Partial update: only fields that are present are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl ListPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.todo_item.is_none() && self.date_time.is_none()
    }
}
