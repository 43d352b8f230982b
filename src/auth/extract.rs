use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;

use crate::{
    auth::{ADMIN_USER_ID, session},
    config::AppConfig,
    models::User,
    repository::RepositoryState,
};

/// CurrentUser
///
/// The resolved identity of a request: `Some(User)` when a valid session
/// cookie maps to an existing user row, `None` (Anonymous) otherwise.
///
/// This extractor **never rejects**. A missing cookie, a bad or expired
/// signature, an id that no longer exists, or even a database failure all
/// resolve to Anonymous; pages that merely *display* differently for
/// logged-in users must not turn an invalid cookie into an error page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

/// Resolves the session cookie in `parts` to a full user record.
///
/// Identity is read fresh on every request (no caching across requests): the
/// cookie carries only the user id, and the row lookup is the final
/// verification that the account still exists.
async fn resolve_current_user<S>(parts: &mut Parts, state: &S) -> Option<User>
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let repo = RepositoryState::from_ref(state);
    let config = AppConfig::from_ref(state);

    let jar = CookieJar::from_headers(&parts.headers);
    let user_id = session::session_user_id(&jar, &config.secret_key)?;

    match repo.get_user(user_id).await {
        Ok(user) => user,
        Err(e) => {
            // A store failure during identity resolution degrades to Anonymous
            // rather than failing the whole request; the handler's own repo
            // calls will surface the outage as a 5xx if it persists.
            tracing::error!("failed to resolve session user {}: {}", user_id, e);
            None
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolve_current_user(parts, state).await))
    }
}

/// AdminUser
///
/// The authorization guard for the post-management routes. Extraction succeeds
/// only when the session resolves to the designated administrator
/// ([`ADMIN_USER_ID`]); every other identity — including Anonymous — is
/// rejected with 403 Forbidden *before* the handler body runs, so no admin
/// handler can have a side effect on behalf of a non-admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Anonymous fails closed: there is no id to compare, so there is no
        // way through this match.
        match resolve_current_user(parts, state).await {
            Some(user) if user.id == ADMIN_USER_ID => Ok(AdminUser(user)),
            _ => Err(StatusCode::FORBIDDEN),
        }
    }
}
