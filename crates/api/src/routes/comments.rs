//! Route definitions for the `/comments` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::comments;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// GET    /          -> list_top_level
/// POST   /          -> create
/// DELETE /wipe      -> wipe_all
/// GET    /{id}      -> get_by_id
/// PUT    /{id}      -> update
/// DELETE /{id}      -> delete (cascades to the whole reply subtree)
/// ```
///
/// `/wipe` is a static segment and takes precedence over the `/{id}`
/// capture, so it can never be shadowed by a comment id.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(comments::list_top_level).post(comments::create))
        .route("/wipe", delete(comments::wipe_all))
        .route(
            "/{id}",
            get(comments::get_by_id)
                .put(comments::update)
                .delete(comments::delete),
        )
}
