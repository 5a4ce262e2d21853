// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitboard: activity posts and to-do lists for a fitness social app
//!
//! This crate provides the backend API: account signup and signin with
//! bearer tokens, profile pictures, activity posts with an attached image,
//! and per-user to-do list items.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::{DocumentStore, TimedStore};
use services::{ListService, MediaStore, PasswordHasher, PostService, TimedMedia, UserService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub lists: ListService,
    pub posts: PostService,
    pub users: UserService,
}

impl AppState {
    /// Wire the services over `store` and `media`.
    ///
    /// Both collaborators are wrapped so that no single call can outlast
    /// `config.external_call_timeout`.
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, media: Arc<dyn MediaStore>) -> Self {
        let limit = config.external_call_timeout;
        let store: Arc<dyn DocumentStore> = Arc::new(TimedStore::new(store, limit));
        let media: Arc<dyn MediaStore> = Arc::new(TimedMedia::new(media, limit));

        Self {
            lists: ListService::new(store.clone()),
            posts: PostService::new(store.clone(), media.clone()),
            users: UserService::new(
                store.clone(),
                media,
                PasswordHasher::new(config.password_iterations),
            ),
            store,
            config,
        }
    }
}
