//! Repository for the `comments` table.
//!
//! Static queries use `?N` placeholders so bind positions stay explicit;
//! dynamically assembled queries (filters, id lists) use positional `?`
//! and push binds in the same order the SQL fragments are pushed.

use chrono::Utc;
use comments_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::comment::{
    Comment, CommentSearchParams, ImportedComment, NewComment, UpdateComment,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, text, author, created_at, likes, image_url, parent_id, depth";

/// Provides CRUD and subtree operations for comments.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a new comment, returning the created row.
    ///
    /// `id` and `created_at` are store-assigned; `likes` starts at the
    /// column default of 0.
    pub async fn insert(pool: &SqlitePool, input: &NewComment) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (text, author, created_at, image_url, parent_id, depth)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(&input.text)
            .bind(&input.author)
            .bind(Utc::now())
            .bind(&input.image_url)
            .bind(input.parent_id)
            .bind(input.depth)
            .fetch_one(pool)
            .await
    }

    /// Insert an imported comment, returning the created row.
    ///
    /// Unlike [`CommentRepo::insert`], the caller may supply the creation
    /// time and a likes count. Imported comments are always top level.
    pub async fn insert_imported(
        pool: &SqlitePool,
        input: &ImportedComment,
    ) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (text, author, created_at, likes, image_url, parent_id, depth)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, 0)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(&input.text)
            .bind(&input.author)
            .bind(input.created_at.unwrap_or_else(Utc::now))
            .bind(input.likes)
            .bind(&input.image_url)
            .fetch_one(pool)
            .await
    }

    /// Find a comment by its ID.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = ?1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a comment. Only non-`None` fields in `input` are applied;
    /// an explicit null for `image_url` clears it.
    ///
    /// `parent_id` is deliberately not part of the statement: the parent
    /// of a stored comment never changes.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        input: &UpdateComment,
    ) -> Result<Option<Comment>, sqlx::Error> {
        // For image_url: if the outer Option is Some, use the inner value
        // (which may be None to clear). If the outer Option is None, keep
        // the stored value.
        let image_url_provided = input.image_url.is_some();
        let image_url_value = input.image_url.as_ref().and_then(|url| url.as_deref());

        let query = format!(
            "UPDATE comments SET
                text      = COALESCE(?2, text),
                author    = COALESCE(?3, author),
                likes     = COALESCE(?4, likes),
                image_url = CASE WHEN ?5 THEN ?6 ELSE image_url END
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(&input.text)
            .bind(&input.author)
            .bind(input.likes)
            .bind(image_url_provided)
            .bind(image_url_value)
            .fetch_optional(pool)
            .await
    }

    /// List top-level comments, newest first.
    pub async fn list_roots(pool: &SqlitePool) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments
             WHERE parent_id IS NULL
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Comment>(&query).fetch_all(pool).await
    }

    /// List every comment regardless of nesting, newest first.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments ORDER BY created_at DESC");
        sqlx::query_as::<_, Comment>(&query).fetch_all(pool).await
    }

    /// List the direct replies to a comment, newest first.
    pub async fn list_children(
        pool: &SqlitePool,
        parent_id: DbId,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments
             WHERE parent_id = ?1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a comment and its entire reply subtree in one transaction.
    ///
    /// Descendant ids are collected level by level, then removed with a
    /// single batch delete so the operation is all-or-nothing. Returns
    /// the number of rows removed, or 0 when `id` does not exist.
    pub async fn delete_subtree(pool: &SqlitePool, id: DbId) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let root = sqlx::query_scalar::<_, DbId>("SELECT id FROM comments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if root.is_none() {
            return Ok(0);
        }

        let mut subtree = vec![id];
        let mut frontier = vec![id];
        while !frontier.is_empty() {
            let placeholders = vec!["?"; frontier.len()].join(", ");
            let query = format!("SELECT id FROM comments WHERE parent_id IN ({placeholders})");
            let mut children_query = sqlx::query_scalar::<_, DbId>(&query);
            for &parent_id in &frontier {
                children_query = children_query.bind(parent_id);
            }
            let children = children_query.fetch_all(&mut *tx).await?;
            subtree.extend(&children);
            frontier = children;
        }

        let placeholders = vec!["?"; subtree.len()].join(", ");
        let query = format!("DELETE FROM comments WHERE id IN ({placeholders})");
        let mut delete_query = sqlx::query(&query);
        for &comment_id in &subtree {
            delete_query = delete_query.bind(comment_id);
        }
        let result = delete_query.execute(&mut *tx).await?;

        tx.commit().await?;

        tracing::debug!(id, deleted = result.rows_affected(), "Deleted comment subtree");
        Ok(result.rows_affected())
    }

    /// Delete every comment. Returns the number of rows removed.
    pub async fn delete_all(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments").execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Flat filtered listing for the admin surface, newest first.
    pub async fn search(
        pool: &SqlitePool,
        params: &CommentSearchParams,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let mut conditions: Vec<&str> = Vec::new();
        if params.author.is_some() {
            conditions.push("author = ?");
        }
        if params.search.is_some() {
            conditions.push("(text LIKE ? OR author LIKE ?)");
        }
        if params.from.is_some() {
            conditions.push("created_at >= ?");
        }
        if params.to.is_some() {
            conditions.push("created_at <= ?");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let query = format!("SELECT {COLUMNS} FROM comments{where_clause} ORDER BY created_at DESC");

        let mut list_query = sqlx::query_as::<_, Comment>(&query);
        if let Some(ref author) = params.author {
            list_query = list_query.bind(author);
        }
        if let Some(ref search) = params.search {
            let pattern = format!("%{search}%");
            list_query = list_query.bind(pattern.clone()).bind(pattern);
        }
        if let Some(from) = params.from {
            list_query = list_query.bind(from);
        }
        if let Some(to) = params.to {
            list_query = list_query.bind(to);
        }
        list_query.fetch_all(pool).await
    }
}
