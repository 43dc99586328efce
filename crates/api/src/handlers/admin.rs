//! Read-only inspection endpoints for operators.
//!
//! Serves the flat view an admin screen needs: every stored comment
//! regardless of nesting, filterable, newest first.

use axum::extract::{Query, State};
use axum::Json;
use comments_db::models::comment::{Comment, CommentSearchParams};
use comments_db::repositories::CommentRepo;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/admin/comments
///
/// Optional query filters: `author` (exact), `search` (substring over
/// text and author), `from` / `to` (inclusive RFC 3339 bounds on
/// creation time).
pub async fn search_comments(
    State(state): State<AppState>,
    Query(params): Query<CommentSearchParams>,
) -> AppResult<Json<Vec<Comment>>> {
    let comments = CommentRepo::search(&state.pool, &params).await?;
    Ok(Json(comments))
}
