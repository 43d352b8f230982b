use crate::{
    AppState,
    auth::{AdminUser, CurrentUser, Flash, clear_session, establish_session, set_flash, take_flash},
    auth::{hash_password, verify_password},
    error::AppError,
    models::{
        AuthPage, CommentForm, IndexPage, LoginForm, PostForm, PostFormPage, PostPage,
        RegisterForm, UserView,
    },
};
use axum::{
    Json,
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

// --- Read-only pages ---

/// get_all_posts
///
/// [Public Route] The index page: every post, newest first, plus the viewer
/// identity and any pending flash (consumed here so it renders exactly once).
pub async fn get_all_posts(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<IndexPage>), AppError> {
    let posts = state.repo.list_posts().await?;
    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(IndexPage {
            posts,
            current_user: user.as_ref().map(UserView::from_user),
            flash,
        }),
    ))
}

/// show_post
///
/// [Public Route] The post detail page: the post, its comments (author names
/// joined in), the viewer identity, and any pending flash.
///
/// A missing post id is a 404, full stop — the detail view must never trust
/// that the id in the URL still exists.
pub async fn show_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<PostPage>), AppError> {
    let post = state
        .repo
        .get_post(post_id)
        .await?
        .ok_or(AppError::NotFound("post"))?;
    let comments = state.repo.get_comments(post_id).await?;
    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(PostPage {
            post,
            comments,
            current_user: user.as_ref().map(UserView::from_user),
            flash,
        }),
    ))
}

/// about
///
/// [Public Route] Static page; no state beyond the page identifier.
pub async fn about() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "page": "about" }))
}

/// contact
///
/// [Public Route] Static page; no state beyond the page identifier.
pub async fn contact() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "page": "contact" }))
}

// --- Registration / login / logout ---

/// register_form
///
/// [Public Route] GET half of /register: surfaces any pending flash for the
/// externally rendered form.
pub async fn register_form(jar: CookieJar) -> (CookieJar, Json<AuthPage>) {
    let (jar, flash) = take_flash(jar);
    (jar, Json(AuthPage { flash }))
}

/// register
///
/// [Public Route] Registration protocol: an already-registered email warns
/// and redirects to /login; otherwise the password is hashed, the user is
/// created, and the session is established before redirecting to the index.
///
/// The pre-insert lookup gives the friendly warning path; the UNIQUE index on
/// `users.email` closes the race where two registrations for one email land
/// concurrently — the loser's Conflict takes the same warning path.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if state.repo.get_user_by_email(&form.email).await?.is_some() {
        let jar = set_flash(jar, Flash::EmailTaken);
        return Ok((jar, Redirect::to("/login")).into_response());
    }

    let digest = hash_password(&form.password)?;
    let user = match state.repo.create_user(&form.email, &digest, &form.name).await {
        Ok(user) => user,
        Err(AppError::Conflict(_)) => {
            let jar = set_flash(jar, Flash::EmailTaken);
            return Ok((jar, Redirect::to("/login")).into_response());
        }
        Err(e) => return Err(e),
    };

    tracing::info!(user_id = user.id, "new user registered");
    let jar = establish_session(jar, &state.config.secret_key, user.id)?;
    Ok((jar, Redirect::to("/")).into_response())
}

/// login_form
///
/// [Public Route] GET half of /login.
pub async fn login_form(jar: CookieJar) -> (CookieJar, Json<AuthPage>) {
    let (jar, flash) = take_flash(jar);
    (jar, Json(AuthPage { flash }))
}

/// login
///
/// [Public Route] Login protocol: unknown email and wrong password each warn
/// and redirect back to /login (leaving the session Anonymous); a verified
/// credential establishes the session and redirects to the index.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = match state.repo.get_user_by_email(&form.email).await? {
        Some(user) => user,
        None => {
            let jar = set_flash(jar, Flash::EmailNotFound);
            return Ok((jar, Redirect::to("/login")).into_response());
        }
    };

    if !verify_password(&user.password_hash, &form.password) {
        let jar = set_flash(jar, Flash::PasswordIncorrect);
        return Ok((jar, Redirect::to("/login")).into_response());
    }

    let jar = establish_session(jar, &state.config.secret_key, user.id)?;
    Ok((jar, Redirect::to("/")).into_response())
}

/// logout
///
/// [Public Route] Clears the session identity unconditionally and returns to
/// the index.
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (clear_session(jar), Redirect::to("/"))
}

// --- Comments ---

/// submit_comment
///
/// [Public Route, auth-gated inside] POST half of /post/{id}: an Anonymous
/// submitter is warned and sent to /login with nothing written; an
/// authenticated one gets a comment row linking their id and the post, then a
/// redirect back to the same post (the classic post/redirect/get step against
/// form resubmission).
pub async fn submit_comment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    jar: CookieJar,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    // Guard the parent row before anything else; commenting on a deleted post
    // must 404 rather than insert a dangling foreign key.
    state
        .repo
        .get_post(post_id)
        .await?
        .ok_or(AppError::NotFound("post"))?;

    let user = match user {
        Some(user) => user,
        None => {
            let jar = set_flash(jar, Flash::LoginToComment);
            return Ok((jar, Redirect::to("/login")).into_response());
        }
    };

    state
        .repo
        .create_comment(post_id, user.id, &form.text)
        .await?;
    Ok(Redirect::to(&format!("/post/{post_id}")).into_response())
}

// --- Admin post management ---

/// new_post_form
///
/// [Admin Route] GET half of /new-post: a blank form model. The `AdminUser`
/// extractor has already rejected every non-admin identity with 403.
pub async fn new_post_form(_admin: AdminUser, jar: CookieJar) -> (CookieJar, Json<PostFormPage>) {
    let (jar, flash) = take_flash(jar);
    (
        jar,
        Json(PostFormPage {
            form: PostForm::default(),
            flash,
        }),
    )
}

/// create_post
///
/// [Admin Route] Creates a post authored by the admin, stamped with today's
/// date as a long-form display string. A duplicate title is a business-rule
/// conflict: warn and return to the form, not a 5xx.
pub async fn create_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let date = chrono::Utc::now().format("%B %d, %Y").to_string();
    match state.repo.create_post(&form, admin.id, &date).await {
        Ok(post) => {
            tracing::info!(post_id = post.id, "post created");
            Ok(Redirect::to("/").into_response())
        }
        Err(AppError::Conflict(_)) => {
            let jar = set_flash(jar, Flash::TitleTaken);
            Ok((jar, Redirect::to("/new-post")).into_response())
        }
        Err(e) => Err(e),
    }
}

/// edit_post_form
///
/// [Admin Route] GET half of /edit-post/{id}: the form pre-populated from the
/// existing post, 404 when the id is stale.
pub async fn edit_post_form(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<PostFormPage>), AppError> {
    let post = state
        .repo
        .get_post(post_id)
        .await?
        .ok_or(AppError::NotFound("post"))?;
    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(PostFormPage {
            form: PostForm::from_post(&post),
            flash,
        }),
    ))
}

/// update_post
///
/// [Admin Route] Overwrites title/subtitle/img_url/body; the author and the
/// creation date survive every edit. Redirects to the post's detail page.
pub async fn update_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    jar: CookieJar,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    match state.repo.update_post(post_id, &form).await {
        Ok(Some(_)) => Ok(Redirect::to(&format!("/post/{post_id}")).into_response()),
        Ok(None) => Err(AppError::NotFound("post")),
        Err(AppError::Conflict(_)) => {
            let jar = set_flash(jar, Flash::TitleTaken);
            Ok((jar, Redirect::to(&format!("/edit-post/{post_id}"))).into_response())
        }
        Err(e) => Err(e),
    }
}

/// delete_post
///
/// [Admin Route] Deletes the post and every comment referencing it (one
/// transaction in the repository), then returns to the index.
pub async fn delete_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Redirect, AppError> {
    if state.repo.delete_post(post_id).await? {
        tracing::info!(post_id, "post deleted");
        Ok(Redirect::to("/"))
    } else {
        Err(AppError::NotFound("post"))
    }
}
