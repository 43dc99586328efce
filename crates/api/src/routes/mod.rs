pub mod comments;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /comments                 list (GET), create (POST)
/// /comments/wipe            wipe_all (DELETE)
/// /comments/{id}            get, update, delete (cascades to replies)
///
/// /admin/comments           flat filtered listing (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Threaded comments.
        .nest("/comments", comments::router())
        // Operator inspection endpoints.
        .route("/admin/comments", get(admin::search_comments))
}
