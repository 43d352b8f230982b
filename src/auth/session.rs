use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Name of the session cookie. Its value is a signed token whose claims carry
/// only the user id; everything else about the user is re-read from the
/// database on each request.
pub const SESSION_COOKIE: &str = "session";

/// Name of the one-shot flash cookie. Holds a short machine code (see
/// [`Flash`]) rather than free text, keeping the cookie value RFC 6265-clean.
pub const FLASH_COOKIE: &str = "flash";

// Sessions outlive a browser restart but not a stolen laptop: one week.
const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Claims
///
/// The payload signed into the session cookie. `sub` is the user's row id;
/// `exp` bounds the lifetime of a leaked cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    pub iat: usize,
}

/// issue_session_token
///
/// Signs a fresh session token (HS256) for the given user id.
pub fn issue_session_token(secret: &str, user_id: i64) -> Result<String, AppError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign session token: {e}")))
}

/// decode_session_token
///
/// Validates a session token and extracts the user id. Any failure (bad
/// signature, expired, malformed) is `None`: an invalid cookie resolves to an
/// anonymous request, never an error.
pub fn decode_session_token(secret: &str, token: &str) -> Option<i64> {
    let validation = Validation::default();
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims.sub)
}

/// establish_session
///
/// Transitions the request's identity to Authenticated(user_id) by adding the
/// signed session cookie to the jar. Called on successful registration and login.
pub fn establish_session(
    jar: CookieJar,
    secret: &str,
    user_id: i64,
) -> Result<CookieJar, AppError> {
    let token = issue_session_token(secret, user_id)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(jar.add(cookie))
}

/// clear_session
///
/// Transitions back to Anonymous unconditionally (logout).
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

/// session_user_id
///
/// Reads the session cookie from the jar, if any, and resolves it to a user id.
pub fn session_user_id(jar: &CookieJar, secret: &str) -> Option<i64> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| decode_session_token(secret, cookie.value()))
}

/// Flash
///
/// The one-shot, session-scoped notices this application can emit. The cookie
/// stores the stable code; the user-facing text lives here so the template
/// layer renders a consistent message for each code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    EmailTaken,
    EmailNotFound,
    PasswordIncorrect,
    LoginToComment,
    TitleTaken,
}

impl Flash {
    pub fn code(self) -> &'static str {
        match self {
            Flash::EmailTaken => "email-taken",
            Flash::EmailNotFound => "email-not-found",
            Flash::PasswordIncorrect => "password-incorrect",
            Flash::LoginToComment => "login-to-comment",
            Flash::TitleTaken => "title-taken",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "email-taken" => Some(Flash::EmailTaken),
            "email-not-found" => Some(Flash::EmailNotFound),
            "password-incorrect" => Some(Flash::PasswordIncorrect),
            "login-to-comment" => Some(Flash::LoginToComment),
            "title-taken" => Some(Flash::TitleTaken),
            _ => None,
        }
    }

    /// The user-visible text shown on the next rendered page.
    pub fn message(self) -> &'static str {
        match self {
            Flash::EmailTaken => "You've already signed up with that email, log in instead!",
            Flash::EmailNotFound => "That email doesn't exist, please try again.",
            Flash::PasswordIncorrect => "Password incorrect, please try again.",
            Flash::LoginToComment => "You need to login or register to comment.",
            Flash::TitleTaken => "A post with that title already exists.",
        }
    }
}

/// set_flash
///
/// Queues a flash notice for the next rendered page.
pub fn set_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    let cookie = Cookie::build((FLASH_COOKIE, flash.code()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// take_flash
///
/// Consumes any pending flash notice: the message is returned for the current
/// render and the cookie is cleared so it shows exactly once.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    let message = jar
        .get(FLASH_COOKIE)
        .and_then(|cookie| Flash::from_code(cookie.value()))
        .map(|flash| flash.message().to_string());

    if message.is_some() {
        let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/").build());
        (jar, message)
    } else {
        (jar, None)
    }
}
