use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents a registered account stored in the `users` table.
/// The designated administrator is the user whose `id` equals
/// [`crate::auth::ADMIN_USER_ID`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: i64,
    // The login identifier; UNIQUE at the storage level.
    pub email: String,
    /// Salted one-way digest of the password. Never serialized into any
    /// response body or log line; only `auth::verify_password` reads it.
    #[serde(skip_serializing)]
    pub password_hash: String,
    // Display name shown next to posts and comments.
    pub name: String,
}

/// Post
///
/// A blog entry from the `posts` table. `author_id` is a plain foreign key to
/// `users.id`; author details are joined at query time when a view needs them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Post {
    pub id: i64,
    // FK to users.id. Always the admin in practice, but stored explicitly.
    pub author_id: i64,
    // UNIQUE at the storage level.
    pub title: String,
    pub subtitle: String,
    /// Long-form display date fixed at creation time (e.g. "April 05, 2024").
    /// Never changed by edits.
    pub date: String,
    // Rich-text HTML produced by the editor widget; stored verbatim.
    pub body: String,
    pub img_url: String,
}

/// Comment
///
/// A comment row from the `comments` table, augmented with the author's
/// display name (a join against `users`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub text: String,
    // Loaded via a JOIN in the repository query; absent on bare inserts.
    #[sqlx(default)]
    pub author_name: Option<String>,
}

// --- Request Payloads (Form Schemas) ---

/// RegisterForm
///
/// Input payload for POST /register. The plaintext password only ever flows
/// into `auth::hash_password`; it is never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// LoginForm
///
/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// PostForm
///
/// Shared payload for POST /new-post and POST /edit-post/{id}, mirroring the
/// single create/edit form the template layer renders. The author and the
/// creation date are deliberately absent: the server assigns both on create
/// and preserves both on edit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostForm {
    pub title: String,
    pub subtitle: String,
    pub img_url: String,
    pub body: String,
}

impl PostForm {
    /// Pre-populates the edit form from an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            img_url: post.img_url.clone(),
            body: post.body.clone(),
        }
    }
}

/// CommentForm
///
/// Input payload for the comment box on POST /post/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommentForm {
    pub text: String,
}

// --- View Models (Output Schemas) ---

/// PostPage
///
/// View model for GET /post/{id}: the post, its comments (author names
/// joined in), the identity of the viewer (for the comment box), and any
/// pending flash message.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostPage {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub current_user: Option<UserView>,
    pub flash: Option<String>,
}

/// IndexPage
///
/// View model for GET /: every post, newest first, plus the viewer identity
/// so the template can decide whether to show the admin controls.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexPage {
    pub posts: Vec<Post>,
    pub current_user: Option<UserView>,
    pub flash: Option<String>,
}

/// AuthPage
///
/// View model for the GET halves of /register and /login: just the pending
/// flash message, if any (the forms themselves are rendered externally).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthPage {
    pub flash: Option<String>,
}

/// PostFormPage
///
/// View model for GET /new-post (blank) and GET /edit-post/{id}
/// (pre-populated), plus any pending flash (e.g. a duplicate-title warning).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostFormPage {
    pub form: PostForm,
    pub flash: Option<String>,
}

/// UserView
///
/// The slice of `User` that is safe to expose to the template layer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub is_admin: bool,
}

impl UserView {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            is_admin: user.id == crate::auth::ADMIN_USER_ID,
        }
    }
}
