use async_trait::async_trait;
use axum::{
    extract::{Form, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use quillpost::{
    AppError, AppState,
    auth::{AdminUser, CurrentUser, hash_password},
    config::AppConfig,
    handlers,
    models::{Comment, CommentForm, LoginForm, Post, PostForm, RegisterForm, User},
    repository::Repository,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::test;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// This struct is the central control point for testing handler logic.
// Handlers rely on the Repository trait, so we mock the trait implementation:
// canned outputs for reads, atomic flags to prove (or disprove) that a write
// was attempted.
#[derive(Default)]
pub struct MockRepoControl {
    // Pre-canned outputs for handler requests
    pub user_by_email: Option<User>,
    pub post_to_return: Option<Post>,
    pub comments_to_return: Vec<Comment>,
    pub delete_post_result: bool,
    // Simulated storage-level uniqueness violations
    pub conflict_on_create_post: bool,

    // Write-attempt flags, to verify side-effect-free rejection paths
    pub create_user_called: AtomicBool,
    pub create_post_called: AtomicBool,
    pub create_comment_called: AtomicBool,
    pub delete_post_called: AtomicBool,
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, AppError> {
        self.create_user_called.store(true, Ordering::SeqCst);
        Ok(User {
            id: 1,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.to_string(),
        })
    }
    async fn get_user(&self, _id: i64) -> Result<Option<User>, AppError> {
        Ok(self.user_by_email.clone())
    }
    async fn get_user_by_email(&self, _email: &str) -> Result<Option<User>, AppError> {
        Ok(self.user_by_email.clone())
    }
    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        Ok(self.post_to_return.clone().into_iter().collect())
    }
    async fn get_post(&self, _id: i64) -> Result<Option<Post>, AppError> {
        Ok(self.post_to_return.clone())
    }
    async fn create_post(
        &self,
        form: &PostForm,
        author_id: i64,
        date: &str,
    ) -> Result<Post, AppError> {
        self.create_post_called.store(true, Ordering::SeqCst);
        if self.conflict_on_create_post {
            return Err(AppError::Conflict("a post with that title already exists"));
        }
        Ok(Post {
            id: 7,
            author_id,
            title: form.title.clone(),
            subtitle: form.subtitle.clone(),
            date: date.to_string(),
            body: form.body.clone(),
            img_url: form.img_url.clone(),
        })
    }
    async fn update_post(&self, id: i64, form: &PostForm) -> Result<Option<Post>, AppError> {
        Ok(self.post_to_return.clone().map(|mut p| {
            p.id = id;
            p.title = form.title.clone();
            p
        }))
    }
    async fn delete_post(&self, _id: i64) -> Result<bool, AppError> {
        self.delete_post_called.store(true, Ordering::SeqCst);
        Ok(self.delete_post_result)
    }
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        self.create_comment_called.store(true, Ordering::SeqCst);
        Ok(Comment {
            id: 1,
            author_id,
            post_id,
            text: text.to_string(),
            author_name: None,
        })
    }
    async fn get_comments(&self, _post_id: i64) -> Result<Vec<Comment>, AppError> {
        Ok(self.comments_to_return.clone())
    }
}

// --- Test Helpers ---

fn state_with(repo: Arc<MockRepoControl>) -> AppState {
    AppState {
        repo,
        config: AppConfig::default(),
    }
}

fn sample_post() -> Post {
    Post {
        id: 7,
        author_id: 1,
        title: "Hello".to_string(),
        subtitle: "World".to_string(),
        date: "April 05, 2024".to_string(),
        body: "<p>Body</p>".to_string(),
        img_url: "https://example.com/img.png".to_string(),
    }
}

fn registered_user(id: i64, password: &str) -> User {
    User {
        id,
        email: "a@x.com".to_string(),
        password_hash: hash_password(password).unwrap(),
        name: "A".to_string(),
    }
}

fn location_of(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("expected a Location header")
        .to_str()
        .unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn has_session_cookie(response: &Response) -> bool {
    set_cookies(response)
        .iter()
        .any(|c| c.starts_with("session=") && !c.starts_with("session=;"))
}

fn flash_code(response: &Response) -> Option<String> {
    set_cookies(response).iter().find_map(|c| {
        c.strip_prefix("flash=")
            .map(|rest| rest.split(';').next().unwrap().to_string())
    })
}

// --- Comment submission ---

#[test]
async fn test_anonymous_comment_redirects_to_login_with_no_write() {
    let repo = Arc::new(MockRepoControl {
        post_to_return: Some(sample_post()),
        ..Default::default()
    });
    let state = state_with(repo.clone());

    let response = handlers::submit_comment(
        CurrentUser(None),
        State(state),
        Path(7),
        CookieJar::default(),
        Form(CommentForm {
            text: "first!".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login");
    assert_eq!(flash_code(&response).as_deref(), Some("login-to-comment"));
    assert!(!repo.create_comment_called.load(Ordering::SeqCst));
}

#[test]
async fn test_authenticated_comment_is_created_and_redirects_back() {
    let repo = Arc::new(MockRepoControl {
        post_to_return: Some(sample_post()),
        ..Default::default()
    });
    let state = state_with(repo.clone());

    let response = handlers::submit_comment(
        CurrentUser(Some(registered_user(3, "pw"))),
        State(state),
        Path(7),
        CookieJar::default(),
        Form(CommentForm {
            text: "nice post".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/post/7");
    assert!(repo.create_comment_called.load(Ordering::SeqCst));
}

#[test]
async fn test_comment_on_missing_post_is_not_found() {
    let repo = Arc::new(MockRepoControl::default());
    let state = state_with(repo.clone());

    let result = handlers::submit_comment(
        CurrentUser(Some(registered_user(3, "pw"))),
        State(state),
        Path(404),
        CookieJar::default(),
        Form(CommentForm {
            text: "into the void".to_string(),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(!repo.create_comment_called.load(Ordering::SeqCst));
}

// --- Registration ---

#[test]
async fn test_register_duplicate_email_redirects_to_login_without_insert() {
    let repo = Arc::new(MockRepoControl {
        user_by_email: Some(registered_user(2, "pw1")),
        ..Default::default()
    });
    let state = state_with(repo.clone());

    let response = handlers::register(
        State(state),
        CookieJar::default(),
        Form(RegisterForm {
            email: "a@x.com".to_string(),
            password: "pw2".to_string(),
            name: "A again".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login");
    assert_eq!(flash_code(&response).as_deref(), Some("email-taken"));
    assert!(!repo.create_user_called.load(Ordering::SeqCst));
    assert!(!has_session_cookie(&response));
}

#[test]
async fn test_register_success_establishes_session_and_redirects_home() {
    let repo = Arc::new(MockRepoControl::default());
    let state = state_with(repo.clone());

    let response = handlers::register(
        State(state),
        CookieJar::default(),
        Form(RegisterForm {
            email: "a@x.com".to_string(),
            password: "pw1".to_string(),
            name: "A".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
    assert!(repo.create_user_called.load(Ordering::SeqCst));
    assert!(has_session_cookie(&response));
}

// --- Login ---

#[test]
async fn test_login_unknown_email_warns_and_stays_anonymous() {
    let repo = Arc::new(MockRepoControl::default());
    let state = state_with(repo);

    let response = handlers::login(
        State(state),
        CookieJar::default(),
        Form(LoginForm {
            email: "ghost@x.com".to_string(),
            password: "pw".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login");
    assert_eq!(flash_code(&response).as_deref(), Some("email-not-found"));
    assert!(!has_session_cookie(&response));
}

#[test]
async fn test_login_wrong_password_warns_and_stays_anonymous() {
    let repo = Arc::new(MockRepoControl {
        user_by_email: Some(registered_user(2, "right-password")),
        ..Default::default()
    });
    let state = state_with(repo);

    let response = handlers::login(
        State(state),
        CookieJar::default(),
        Form(LoginForm {
            email: "a@x.com".to_string(),
            password: "wrong-password".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/login");
    assert_eq!(flash_code(&response).as_deref(), Some("password-incorrect"));
    assert!(!has_session_cookie(&response));
}

#[test]
async fn test_login_success_establishes_session() {
    let repo = Arc::new(MockRepoControl {
        user_by_email: Some(registered_user(2, "right-password")),
        ..Default::default()
    });
    let state = state_with(repo);

    let response = handlers::login(
        State(state),
        CookieJar::default(),
        Form(LoginForm {
            email: "a@x.com".to_string(),
            password: "right-password".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
    assert!(has_session_cookie(&response));
}

#[test]
async fn test_logout_clears_the_session_cookie() {
    let response = handlers::logout(CookieJar::default()).await.into_response();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
    // The removal cookie blanks the value.
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("session=;") || c.starts_with("session=\"\""))
    );
}

// --- Post detail hardening ---

#[test]
async fn test_show_post_missing_id_is_not_found() {
    let repo = Arc::new(MockRepoControl::default());
    let state = state_with(repo);

    let result = handlers::show_post(
        CurrentUser(None),
        State(state),
        Path(404),
        CookieJar::default(),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

// --- Admin post management ---

#[test]
async fn test_create_post_success_redirects_home() {
    let repo = Arc::new(MockRepoControl::default());
    let state = state_with(repo.clone());

    let response = handlers::create_post(
        AdminUser(registered_user(1, "pw")),
        State(state),
        CookieJar::default(),
        Form(PostForm {
            title: "Hello".to_string(),
            subtitle: "World".to_string(),
            img_url: "https://example.com/i.png".to_string(),
            body: "<p>Body</p>".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
    assert!(repo.create_post_called.load(Ordering::SeqCst));
}

#[test]
async fn test_create_post_duplicate_title_warns_and_returns_to_form() {
    let repo = Arc::new(MockRepoControl {
        conflict_on_create_post: true,
        ..Default::default()
    });
    let state = state_with(repo);

    let response = handlers::create_post(
        AdminUser(registered_user(1, "pw")),
        State(state),
        CookieJar::default(),
        Form(PostForm {
            title: "Hello".to_string(),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/new-post");
    assert_eq!(flash_code(&response).as_deref(), Some("title-taken"));
}

#[test]
async fn test_edit_post_form_prefills_from_existing_post() {
    let repo = Arc::new(MockRepoControl {
        post_to_return: Some(sample_post()),
        ..Default::default()
    });
    let state = state_with(repo);

    let (_jar, axum::Json(page)) = handlers::edit_post_form(
        AdminUser(registered_user(1, "pw")),
        State(state),
        Path(7),
        CookieJar::default(),
    )
    .await
    .unwrap();

    assert_eq!(page.form.title, "Hello");
    assert_eq!(page.form.subtitle, "World");
}

#[test]
async fn test_edit_post_form_missing_id_is_not_found() {
    let repo = Arc::new(MockRepoControl::default());
    let state = state_with(repo);

    let result = handlers::edit_post_form(
        AdminUser(registered_user(1, "pw")),
        State(state),
        Path(404),
        CookieJar::default(),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
async fn test_delete_post_redirects_home_on_success() {
    let repo = Arc::new(MockRepoControl {
        delete_post_result: true,
        ..Default::default()
    });
    let state = state_with(repo.clone());

    let response = handlers::delete_post(AdminUser(registered_user(1, "pw")), State(state), Path(7))
        .await
        .unwrap()
        .into_response();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
    assert!(repo.delete_post_called.load(Ordering::SeqCst));
}

#[test]
async fn test_delete_post_missing_id_is_not_found() {
    let repo = Arc::new(MockRepoControl::default());
    let state = state_with(repo);

    let result =
        handlers::delete_post(AdminUser(registered_user(1, "pw")), State(state), Path(404)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
