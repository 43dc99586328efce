//! Reply-nesting policy for the comment tree.
//!
//! A comment's depth is fixed at creation: 0 for top-level comments,
//! parent depth plus one for replies. Creation is capped so no comment
//! ever sits deeper than [`MAX_REPLY_DEPTH`], and rendering applies a
//! visibility rule per depth so a listing never expands past that level.

use crate::error::CoreError;

/// Deepest level a comment can occupy. Comments at this depth still
/// exist and render, but can no longer accept replies.
pub const MAX_REPLY_DEPTH: i64 = 2;

/// Depth of a new comment given its parent's depth, or `None` for a
/// top-level comment.
pub fn compute_depth(parent_depth: Option<i64>) -> i64 {
    match parent_depth {
        Some(depth) => depth + 1,
        None => 0,
    }
}

/// Whether a comment at `parent_depth` can take one more reply.
pub fn can_accept_reply(parent_depth: i64) -> bool {
    parent_depth < MAX_REPLY_DEPTH
}

/// How much of a comment's reply subtree is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyVisibility {
    /// Render the subtree recursively (top-level comments).
    Subtree,
    /// Render immediate children only, each with an empty reply list.
    ChildrenOnly,
    /// Render no replies at all.
    Hidden,
}

/// Visibility rule for a comment at `depth`.
pub fn reply_visibility(depth: i64) -> ReplyVisibility {
    match depth {
        0 => ReplyVisibility::Subtree,
        1 => ReplyVisibility::ChildrenOnly,
        _ => ReplyVisibility::Hidden,
    }
}

/// Validate comment text: it must contain at least one
/// non-whitespace character.
pub fn validate_comment_text(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation(
            "Comment text cannot be empty.".to_string(),
        ));
    }
    Ok(())
}
