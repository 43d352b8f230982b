use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Public Router Module
///
/// Defines endpoints accessible to any client (anonymous or logged-in): the
/// reading surface, the static pages, and the identity gateways.
///
/// The POST half of /post/{id} (comment submission) lives here rather than
/// behind an auth layer because the GET half must stay anonymous; the handler
/// itself redirects unauthenticated submitters to /login.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // The index page: all posts, newest first.
        .route("/", get(handlers::get_all_posts))
        // GET/POST /register
        // Registration form model / submission. A duplicate email redirects
        // to /login with a warning instead of creating a second account.
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        // GET/POST /login
        .route("/login", get(handlers::login_form).post(handlers::login))
        // GET /logout
        // Clears the session unconditionally and returns to the index.
        .route("/logout", get(handlers::logout))
        // GET/POST /post/{id}
        // Post detail view (404 on a stale id) and comment submission.
        .route(
            "/post/{post_id}",
            get(handlers::show_post).post(handlers::submit_comment),
        )
        // Static pages.
        .route("/about", get(handlers::about))
        .route("/contact", get(handlers::contact))
}
