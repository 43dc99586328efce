//! Handlers for the `/comments` resource.
//!
//! Implements the threaded-comment rules: every comment created through
//! the API is authored by [`COMMENT_AUTHOR`], replies stop at the
//! maximum nesting depth, a comment's parent never changes after
//! creation, and deleting a comment takes its whole reply subtree along.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use comments_core::error::CoreError;
use comments_core::thread::{self, ReplyVisibility};
use comments_core::types::DbId;
use comments_db::models::comment::{
    Comment, CommentTree, CreateComment, NewComment, ReplyIndex, UpdateComment,
};
use comments_db::repositories::CommentRepo;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Author recorded on every comment created through the API, regardless
/// of what the caller sends.
pub const COMMENT_AUTHOR: &str = "Admin";

/// POST /api/v1/comments
///
/// Creates a top-level comment, or a reply when `parent_id` is given.
/// The reply is rejected when the parent is missing or already sits at
/// the maximum nesting depth.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateComment>,
) -> AppResult<(StatusCode, Json<CommentTree>)> {
    thread::validate_comment_text(&input.text)?;

    let parent = match input.parent_id {
        Some(parent_id) => Some(
            CommentRepo::find_by_id(&state.pool, parent_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "Comment",
                    id: parent_id,
                }))?,
        ),
        None => None,
    };

    if let Some(ref parent) = parent {
        if !thread::can_accept_reply(parent.depth) {
            return Err(AppError::Core(CoreError::Validation(
                "Maximum comment nesting depth reached.".to_string(),
            )));
        }
    }

    let depth = thread::compute_depth(parent.as_ref().map(|p| p.depth));
    let comment = CommentRepo::insert(
        &state.pool,
        &NewComment {
            text: input.text,
            author: COMMENT_AUTHOR.to_string(),
            image_url: input.image_url,
            parent_id: input.parent_id,
            depth,
        },
    )
    .await?;

    // A fresh comment has no replies yet; shape against an empty index.
    let tree = CommentTree::shape(comment, &ReplyIndex::default());
    Ok((StatusCode::CREATED, Json(tree)))
}

/// GET /api/v1/comments
///
/// Top-level comments only, newest first, each carrying its visible
/// reply subtree.
pub async fn list_top_level(State(state): State<AppState>) -> AppResult<Json<Vec<CommentTree>>> {
    let roots = CommentRepo::list_roots(&state.pool).await?;
    let all = CommentRepo::list_all(&state.pool).await?;

    let index = ReplyIndex::build(all);
    let trees = roots
        .into_iter()
        .map(|comment| CommentTree::shape(comment, &index))
        .collect();
    Ok(Json(trees))
}

/// GET /api/v1/comments/{id}
///
/// Any comment, not just top-level ones, shaped with its visible replies.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<CommentTree>> {
    let comment = CommentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id,
        }))?;

    let tree = shape_with_replies(&state, comment).await?;
    Ok(Json(tree))
}

/// PUT /api/v1/comments/{id}
///
/// Partial update: absent fields keep their stored values (an absent
/// author keeps the original author, unlike create which forces it).
/// Naming a different parent -- or an explicit null on a reply -- is
/// rejected without applying anything.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateComment>,
) -> AppResult<Json<CommentTree>> {
    let existing = CommentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id,
        }))?;

    if let Some(requested_parent) = input.parent_id {
        if requested_parent != existing.parent_id {
            return Err(AppError::Core(CoreError::Validation(
                "Cannot change the parent of an existing comment.".to_string(),
            )));
        }
    }

    if let Some(ref text) = input.text {
        thread::validate_comment_text(text)?;
    }

    let updated = CommentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id,
        }))?;

    let tree = shape_with_replies(&state, updated).await?;
    Ok(Json(tree))
}

/// DELETE /api/v1/comments/{id}
///
/// Removes the comment and every transitive reply.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let deleted = CommentRepo::delete_subtree(&state.pool, id).await?;
    if deleted == 0 {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/comments/wipe
///
/// Removes every comment and reports how many went away.
pub async fn wipe_all(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let deleted = CommentRepo::delete_all(&state.pool).await?;
    tracing::info!(deleted, "Wiped all comments");
    Ok(Json(json!({ "deleted": deleted })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load the rows visible below `comment` and shape the full node.
///
/// Visibility never reaches past the grandchildren of a top-level
/// comment, so at most the children and their children are fetched.
async fn shape_with_replies(state: &AppState, comment: Comment) -> Result<CommentTree, AppError> {
    let mut related: Vec<Comment> = Vec::new();

    if thread::reply_visibility(comment.depth) != ReplyVisibility::Hidden {
        let children = CommentRepo::list_children(&state.pool, comment.id).await?;
        for child in &children {
            if thread::reply_visibility(child.depth) != ReplyVisibility::Hidden {
                related.extend(CommentRepo::list_children(&state.pool, child.id).await?);
            }
        }
        related.extend(children);
    }

    Ok(CommentTree::shape(comment, &ReplyIndex::build(related)))
}
