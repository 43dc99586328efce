//! Comment entity, request DTOs, and the shaped reply tree.

use std::collections::HashMap;

use comments_core::thread::{self, ReplyVisibility};
use comments_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity struct (database row)
// ---------------------------------------------------------------------------

/// A row from the `comments` table.
///
/// `created_at` serializes as `date`, the field name API clients expect.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub text: String,
    pub author: String,
    #[serde(rename = "date")]
    pub created_at: Timestamp,
    pub likes: i64,
    pub image_url: Option<String>,
    pub parent_id: Option<DbId>,
    pub depth: i64,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads and repository inputs)
// ---------------------------------------------------------------------------

/// DTO for creating a comment through the API.
///
/// The author is not part of the payload; the service assigns it.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub text: String,
    pub image_url: Option<String>,
    /// Omit for a top-level comment.
    pub parent_id: Option<DbId>,
}

/// Repository insert input, fully resolved by the service: the author is
/// already assigned and `depth` computed from the parent row. New
/// comments always start with zero likes.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub author: String,
    pub image_url: Option<String>,
    pub parent_id: Option<DbId>,
    pub depth: i64,
}

/// Repository insert input for bulk imports. Imported comments are
/// always top level and may carry the source document's creation time.
#[derive(Debug, Clone)]
pub struct ImportedComment {
    pub text: String,
    pub author: String,
    pub likes: i64,
    pub image_url: Option<String>,
    /// Falls back to the current time when `None`.
    pub created_at: Option<Timestamp>,
}

/// DTO for partially updating a comment. Absent fields keep their
/// stored values.
///
/// `image_url` and `parent_id` distinguish an explicit JSON `null` from
/// an absent key (outer `None` = absent, `Some(None)` = null): null
/// clears `image_url`, while `parent_id` is never written at all -- the
/// handler only reads it to reject parent changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateComment {
    pub text: Option<String>,
    pub author: Option<String>,
    pub likes: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<DbId>>,
}

/// Filters for the flat admin listing. All optional, combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentSearchParams {
    /// Exact author match.
    pub author: Option<String>,
    /// Case-insensitive substring over text and author.
    pub search: Option<String>,
    /// Inclusive lower bound on creation time.
    pub from: Option<Timestamp>,
    /// Inclusive upper bound on creation time.
    pub to: Option<Timestamp>,
}

/// Deserialize a field so an explicit JSON `null` is distinguishable
/// from an absent key. Pair with `#[serde(default)]`: absent stays
/// `None`, `null` arrives as `Some(None)`, a value as `Some(Some(v))`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Shaped reply tree (response payload)
// ---------------------------------------------------------------------------

/// Replies of each comment, grouped by parent id.
///
/// Built once from a flat newest-first listing so shaping a whole page
/// of trees needs no further queries. Input order is preserved within
/// each group.
#[derive(Debug, Default)]
pub struct ReplyIndex {
    children: HashMap<DbId, Vec<Comment>>,
}

impl ReplyIndex {
    /// Group `comments` by their parent id. Top-level comments are
    /// ignored.
    pub fn build(comments: Vec<Comment>) -> Self {
        let mut children: HashMap<DbId, Vec<Comment>> = HashMap::new();
        for comment in comments {
            if let Some(parent_id) = comment.parent_id {
                children.entry(parent_id).or_default().push(comment);
            }
        }
        Self { children }
    }

    /// Replies to the comment with `id`, or an empty slice.
    pub fn children_of(&self, id: DbId) -> &[Comment] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A comment shaped for the wire: entity fields plus the visible part
/// of its reply subtree.
#[derive(Debug, Clone, Serialize)]
pub struct CommentTree {
    pub id: DbId,
    pub text: String,
    pub author: String,
    #[serde(rename = "date")]
    pub created_at: Timestamp,
    pub likes: i64,
    pub image_url: Option<String>,
    pub parent_id: Option<DbId>,
    pub depth: i64,
    pub replies: Vec<CommentTree>,
}

impl CommentTree {
    /// Shape `comment` and the replies visible at its depth.
    ///
    /// Top-level comments expand recursively, depth-1 comments keep
    /// their immediate children with reply lists forced empty, and
    /// anything deeper renders no replies even when the index holds
    /// more rows.
    pub fn shape(comment: Comment, index: &ReplyIndex) -> Self {
        let replies = match thread::reply_visibility(comment.depth) {
            ReplyVisibility::Subtree => index
                .children_of(comment.id)
                .iter()
                .map(|child| Self::shape(child.clone(), index))
                .collect(),
            ReplyVisibility::ChildrenOnly => index
                .children_of(comment.id)
                .iter()
                .map(|child| Self::leaf(child.clone()))
                .collect(),
            ReplyVisibility::Hidden => Vec::new(),
        };
        Self::with_replies(comment, replies)
    }

    /// Shape a comment with its reply list forced empty.
    fn leaf(comment: Comment) -> Self {
        Self::with_replies(comment, Vec::new())
    }

    fn with_replies(comment: Comment, replies: Vec<CommentTree>) -> Self {
        let Comment {
            id,
            text,
            author,
            created_at,
            likes,
            image_url,
            parent_id,
            depth,
        } = comment;
        CommentTree {
            id,
            text,
            author,
            created_at,
            likes,
            image_url,
            parent_id,
            depth,
            replies,
        }
    }
}
