// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod lists;
pub mod media;
pub mod password;
pub mod posts;
pub mod users;

pub use lists::ListService;
pub use media::{CloudinaryClient, MediaStore, MemoryMedia, TimedMedia};
pub use password::PasswordHasher;
pub use posts::{ImageUpload, PostService};
pub use users::UserService;
