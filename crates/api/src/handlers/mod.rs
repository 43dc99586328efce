//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to [`comments_db::repositories`] and map errors via
//! [`crate::error::AppError`].

pub mod admin;
pub mod comments;
