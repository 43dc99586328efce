//! HTTP-level integration tests for the `/comments` API endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener. Where ordering matters, rows are
//! seeded through the repository with fixed creation times.

mod common;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use common::{body_json, delete, get, post_json, put_json};
use comments_db::models::comment::ImportedComment;
use comments_db::repositories::CommentRepo;
use serde_json::json;
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a comment through the API and return its JSON body.
async fn create_comment(pool: &SqlitePool, body: serde_json::Value) -> serde_json::Value {
    let response = post_json(common::build_test_app(pool.clone()), "/api/v1/comments", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

fn imported(text: &str, hour: u32) -> ImportedComment {
    ImportedComment {
        text: text.to_string(),
        author: "Anonymous".to_string(),
        likes: 0,
        image_url: None,
        created_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()),
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_top_level_comment_returns_201(pool: SqlitePool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/comments",
        json!({"text": "First!"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["id"].is_number());
    assert_eq!(json["text"], "First!");
    assert_eq!(json["author"], "Admin");
    assert_eq!(json["likes"], 0);
    assert_eq!(json["depth"], 0);
    assert!(json["parent_id"].is_null());
    assert!(json["image_url"].is_null());
    assert!(json["date"].is_string());
    assert!(json["replies"].as_array().unwrap().is_empty());

    let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["author", "date", "depth", "id", "image_url", "likes", "parent_id", "replies", "text"]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_ignores_caller_supplied_author(pool: SqlitePool) {
    let json = create_comment(
        &pool,
        json!({"text": "mine now", "author": "Mallory", "likes": 99}),
    )
    .await;

    assert_eq!(json["author"], "Admin");
    assert_eq!(json["likes"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_reply_nests_one_level_deeper(pool: SqlitePool) {
    let root = create_comment(&pool, json!({"text": "hi"})).await;

    let reply = create_comment(&pool, json!({"text": "hello", "parent_id": root["id"]})).await;

    assert_eq!(reply["parent_id"], root["id"]);
    assert_eq!(reply["depth"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_whitespace_only_text(pool: SqlitePool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/comments",
        json!({"text": "   "}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Comment text cannot be empty.");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_with_missing_parent_returns_404(pool: SqlitePool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/comments",
        json!({"text": "orphan", "parent_id": 999}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Comment with id 999 not found");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_stops_nesting_at_the_depth_cap(pool: SqlitePool) {
    let root = create_comment(&pool, json!({"text": "level 0"})).await;
    let first = create_comment(&pool, json!({"text": "level 1", "parent_id": root["id"]})).await;
    let second = create_comment(&pool, json!({"text": "level 2", "parent_id": first["id"]})).await;
    assert_eq!(second["depth"], 2);

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/comments",
        json!({"text": "level 3", "parent_id": second["id"]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Maximum comment nesting depth reached.");
}

// ---------------------------------------------------------------------------
// Listing and retrieval
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn listing_shapes_the_whole_thread(pool: SqlitePool) {
    let hi = create_comment(&pool, json!({"text": "hi"})).await;
    let hello = create_comment(&pool, json!({"text": "hello", "parent_id": hi["id"]})).await;
    create_comment(&pool, json!({"text": "deep", "parent_id": hello["id"]})).await;

    let response = get(common::build_test_app(pool), "/api/v1/comments").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let top = json.as_array().unwrap();
    assert_eq!(top.len(), 1, "replies must not appear at the top level");
    assert_eq!(top[0]["text"], "hi");
    assert_eq!(top[0]["replies"][0]["text"], "hello");
    assert_eq!(top[0]["replies"][0]["replies"][0]["text"], "deep");
    assert!(top[0]["replies"][0]["replies"][0]["replies"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_by_id_applies_the_depth_visibility_rule(pool: SqlitePool) {
    let hi = create_comment(&pool, json!({"text": "hi"})).await;
    let hello = create_comment(&pool, json!({"text": "hello", "parent_id": hi["id"]})).await;
    let deep = create_comment(&pool, json!({"text": "deep", "parent_id": hello["id"]})).await;

    // Depth 1: immediate children only, each with an empty reply list.
    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/comments/{}", hello["id"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["replies"][0]["text"], "deep");
    assert!(json["replies"][0]["replies"].as_array().unwrap().is_empty());

    // Depth 2: no replies rendered at all.
    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/comments/{}", deep["id"]),
    )
    .await;
    let json = body_json(response).await;
    assert!(json["replies"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_orders_top_level_newest_first(pool: SqlitePool) {
    CommentRepo::insert_imported(&pool, &imported("early", 9))
        .await
        .unwrap();
    CommentRepo::insert_imported(&pool, &imported("late", 11))
        .await
        .unwrap();
    CommentRepo::insert_imported(&pool, &imported("middle", 10))
        .await
        .unwrap();

    let response = get(common::build_test_app(pool), "/api/v1/comments").await;
    let json = body_json(response).await;

    let texts: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|comment| comment["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["late", "middle", "early"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_nonexistent_comment_returns_404(pool: SqlitePool) {
    let response = get(common::build_test_app(pool), "/api/v1/comments/4242").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn update_applies_partial_fields(pool: SqlitePool) {
    let created = create_comment(&pool, json!({"text": "original"})).await;
    let id = created["id"].as_i64().unwrap();

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/comments/{id}"),
        json!({"text": "edited", "likes": 10}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["text"], "edited");
    assert_eq!(json["likes"], 10);
    assert_eq!(json["author"], "Admin");

    // Unlike create, update accepts an author when one is sent.
    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/comments/{id}"),
        json!({"author": "Moderator"}),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["author"], "Moderator");
    assert_eq!(json["text"], "edited");
    assert_eq!(json["likes"], 10);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_can_clear_the_image(pool: SqlitePool) {
    let created = create_comment(
        &pool,
        json!({"text": "with image", "image_url": "https://cdn.example/a.png"}),
    )
    .await;
    assert_eq!(created["image_url"], "https://cdn.example/a.png");
    let id = created["id"].as_i64().unwrap();

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/comments/{id}"),
        json!({"image_url": null}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["image_url"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_rejects_parent_changes(pool: SqlitePool) {
    let first = create_comment(&pool, json!({"text": "first root"})).await;
    let second = create_comment(&pool, json!({"text": "second root"})).await;
    let reply = create_comment(&pool, json!({"text": "reply", "parent_id": first["id"]})).await;
    let reply_id = reply["id"].as_i64().unwrap();

    // A different parent is rejected.
    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/comments/{reply_id}"),
        json!({"text": "moved?", "parent_id": second["id"]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Cannot change the parent of an existing comment.");

    // So is detaching a reply with an explicit null.
    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/comments/{reply_id}"),
        json!({"parent_id": null}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was applied by the rejected updates.
    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/comments/{reply_id}"),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["text"], "reply");
    assert_eq!(json["parent_id"], first["id"]);

    // Restating the current parent is fine.
    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/comments/{reply_id}"),
        json!({"text": "still here", "parent_id": first["id"]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_accepts_explicit_null_parent_on_roots(pool: SqlitePool) {
    let root = create_comment(&pool, json!({"text": "root"})).await;
    let id = root["id"].as_i64().unwrap();

    // null matches the stored NULL parent, so this is not a move.
    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/comments/{id}"),
        json!({"text": "renamed", "parent_id": null}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["text"], "renamed");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_rejects_whitespace_only_text(pool: SqlitePool) {
    let created = create_comment(&pool, json!({"text": "fine"})).await;
    let id = created["id"].as_i64().unwrap();

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/comments/{id}"),
        json!({"text": "\t \n"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_nonexistent_comment_returns_404(pool: SqlitePool) {
    let response = put_json(
        common::build_test_app(pool),
        "/api/v1/comments/31337",
        json!({"text": "ghost"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Delete and wipe
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_cascades_to_the_whole_subtree(pool: SqlitePool) {
    let hi = create_comment(&pool, json!({"text": "hi"})).await;
    let hello = create_comment(&pool, json!({"text": "hello", "parent_id": hi["id"]})).await;
    create_comment(&pool, json!({"text": "deep", "parent_id": hello["id"]})).await;
    create_comment(&pool, json!({"text": "bystander"})).await;

    let response = delete(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/comments/{}", hi["id"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/comments/{}", hello["id"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(common::build_test_app(pool), "/api/v1/comments").await;
    let json = body_json(response).await;
    let top = json.as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["text"], "bystander");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_nonexistent_comment_returns_404(pool: SqlitePool) {
    let response = delete(common::build_test_app(pool), "/api/v1/comments/404404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn wipe_removes_everything_and_reports_the_count(pool: SqlitePool) {
    let hi = create_comment(&pool, json!({"text": "hi"})).await;
    let hello = create_comment(&pool, json!({"text": "hello", "parent_id": hi["id"]})).await;
    create_comment(&pool, json!({"text": "deep", "parent_id": hello["id"]})).await;
    create_comment(&pool, json!({"text": "another root"})).await;

    let response = delete(common::build_test_app(pool.clone()), "/api/v1/comments/wipe").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["deleted"], 4);

    let response = get(common::build_test_app(pool.clone()), "/api/v1/comments").await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    // Wiping an empty store is fine and reports zero.
    let response = delete(common::build_test_app(pool), "/api/v1/comments/wipe").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["deleted"], 0);
}
