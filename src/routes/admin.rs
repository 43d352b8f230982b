use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Admin Router Module
///
/// The post-management routes, exclusively for the designated administrator
/// (user id 1).
///
/// Access Control:
/// Every handler mounted here takes the `AdminUser` extractor as its first
/// argument, so the identity check runs — fresh, per request — before any
/// handler body. Any other identity, anonymous included, receives 403 with
/// no side effect.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /new-post
        // Blank form model / create submission.
        .route(
            "/new-post",
            get(handlers::new_post_form).post(handlers::create_post),
        )
        // GET/POST /edit-post/{id}
        // Pre-populated form / overwrite submission. Author and creation date
        // are never changed by an edit.
        .route(
            "/edit-post/{post_id}",
            get(handlers::edit_post_form).post(handlers::update_post),
        )
        // GET/POST /delete/{id}
        // Deletes the post and its comments; GET is kept because the original
        // UI drove deletion from a plain link.
        .route(
            "/delete/{post_id}",
            get(handlers::delete_post).post(handlers::delete_post),
        )
}
