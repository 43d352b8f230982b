use crate::{
    error::AppError,
    models::{Comment, Post, PostForm, User},
};
use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (SQLite, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable and usable across Axum's asynchronous
/// task boundaries.
///
/// Every write is atomic per call. Uniqueness violations (duplicate email,
/// duplicate post title) surface as `AppError::Conflict`, never as a crash;
/// all other database failures propagate as `AppError::Database`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Registration insert. Returns Conflict if the email is already taken
    // (the storage-level UNIQUE index is the last line of defense behind the
    // handler's check-then-insert).
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, AppError>;
    // Per-request session resolution: an unknown id is Ok(None), not an error.
    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError>;
    // Used at registration (duplicate check) and login (credential lookup).
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    // --- Posts ---
    // Index page listing, newest first.
    async fn list_posts(&self) -> Result<Vec<Post>, AppError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, AppError>;
    // Admin create. `date` is the pre-formatted display string assigned by the
    // handler; Conflict on a duplicate title.
    async fn create_post(
        &self,
        form: &PostForm,
        author_id: i64,
        date: &str,
    ) -> Result<Post, AppError>;
    // Admin edit: overwrites title/subtitle/img_url/body only. The author and
    // creation date are never touched. Ok(None) when the post does not exist.
    async fn update_post(&self, id: i64, form: &PostForm) -> Result<Option<Post>, AppError>;
    // Admin delete. Removes the post AND its comments in one transaction so no
    // orphaned comment rows can remain. Returns false when the post was absent.
    async fn delete_post(&self, id: i64) -> Result<bool, AppError>;

    // --- Comments ---
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, AppError>;
    // Comments for the post detail page, enriched with the author display name
    // via a query-time join (no object back-references).
    async fn get_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite.
pub struct SqliteRepository {
    pool: SqlitePool,
}

/// connect_pool
///
/// Opens the SQLite connection pool for the given URL, creating the database
/// file on first boot and enabling foreign-key enforcement (SQLite leaves it
/// off by default).
pub async fn connect_pool(db_url: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(db_url)
        .map_err(AppError::from)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory SQLite database exists per connection, so a pool of them
    // would each see a different (empty) schema. One connection keeps it coherent.
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

impl SqliteRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// init_schema
    ///
    /// Creates the three tables on first boot (the original deployment's
    /// create-all-at-startup behavior). UNIQUE indexes on `users.email` and
    /// `posts.title` back the business rules; the FK constraints are enforced
    /// because `connect_pool` turns `foreign_keys` on.
    pub async fn init_schema(&self) -> Result<(), AppError> {
        // One statement per call: the prepared-statement path only executes
        // the first statement of a multi-statement string.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                email         TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name          TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS posts (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL REFERENCES users(id),
                title     TEXT NOT NULL UNIQUE,
                subtitle  TEXT NOT NULL,
                date      TEXT NOT NULL,
                body      TEXT NOT NULL,
                img_url   TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS comments (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL REFERENCES users(id),
                post_id   INTEGER NOT NULL REFERENCES posts(id),
                text      TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Maps a sqlx error to `Conflict` when it is a uniqueness violation,
/// otherwise lets it propagate as a database failure.
fn map_unique_violation(e: sqlx::Error, what: &'static str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(what);
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3)
               RETURNING id, email, password_hash, name"#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        // Concurrent duplicate registration slips past the handler's
        // check-then-insert; the UNIQUE index turns it into a handled conflict.
        .map_err(|e| map_unique_violation(e, "email already registered"))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"SELECT id, author_id, title, subtitle, date, body, img_url
               FROM posts ORDER BY id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(
            r#"SELECT id, author_id, title, subtitle, date, body, img_url
               FROM posts WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn create_post(
        &self,
        form: &PostForm,
        author_id: i64,
        date: &str,
    ) -> Result<Post, AppError> {
        sqlx::query_as::<_, Post>(
            r#"INSERT INTO posts (author_id, title, subtitle, date, body, img_url)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, author_id, title, subtitle, date, body, img_url"#,
        )
        .bind(author_id)
        .bind(&form.title)
        .bind(&form.subtitle)
        .bind(date)
        .bind(&form.body)
        .bind(&form.img_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "a post with that title already exists"))
    }

    async fn update_post(&self, id: i64, form: &PostForm) -> Result<Option<Post>, AppError> {
        sqlx::query_as::<_, Post>(
            r#"UPDATE posts
               SET title = $2, subtitle = $3, img_url = $4, body = $5
               WHERE id = $1
               RETURNING id, author_id, title, subtitle, date, body, img_url"#,
        )
        .bind(id)
        .bind(&form.title)
        .bind(&form.subtitle)
        .bind(&form.img_url)
        .bind(&form.body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "a post with that title already exists"))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, AppError> {
        // The schema declares no ON DELETE CASCADE, so the dependent comments
        // are removed explicitly, inside the same transaction as the post row.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3)
               RETURNING id, author_id, post_id, text"#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn get_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.author_id, c.post_id, c.text, u.name AS author_name
            FROM comments c
            JOIN users u ON c.author_id = u.id
            WHERE c.post_id = $1
            ORDER BY c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}
