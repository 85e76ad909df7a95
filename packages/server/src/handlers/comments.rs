//! Comment handlers, nested under a post.
//!
//! - `GET    /api/v1/posts/{post_id}/comments/`
//! - `POST   /api/v1/posts/{post_id}/comments/`
//! - `GET    /api/v1/posts/{post_id}/comments/{id}/`
//! - `PUT    /api/v1/posts/{post_id}/comments/{id}/`
//! - `PATCH  /api/v1/posts/{post_id}/comments/{id}/`
//! - `DELETE /api/v1/posts/{post_id}/comments/{id}/`
//!
//! Every route first resolves the parent post and answers 404 if it does not
//! exist. A comment id that belongs to another post is also 404.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use yatube::{
    validation::validate_text, Action, Comment, CommentId, Denial, FieldErrors, Policy, Post,
    PostId, User, ValidationError,
};
use yatube_api::{CommentInput, CommentRepr};

use crate::{
    error::{AppError, AppJson, AppPath},
    middleware::auth::OptionalAuth,
    storage::NewComment,
};

use super::{parse_id, AppState};

const POLICY: Policy = Policy::AuthorOrReadOnly;

pub async fn list_comments(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath(post_id): AppPath<String>,
) -> Result<Json<Vec<CommentRepr>>, AppError> {
    POLICY.check_request(user.as_ref(), Action::List)?;
    let post = load_post(&state, &post_id).await?;

    let comments = state.storage.list_comments(post.id).await?;
    Ok(Json(comments.into_iter().map(CommentRepr::from).collect()))
}

/// `POST /api/v1/posts/{post_id}/comments/`
///
/// The parent post is taken from the path; a `post` key in the body is ignored.
pub async fn create_comment(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath(post_id): AppPath<String>,
    AppJson(input): AppJson<CommentInput>,
) -> Result<impl IntoResponse, AppError> {
    POLICY.check_request(user.as_ref(), Action::Create)?;
    let author = user.ok_or(Denial::NotAuthenticated)?;
    let post = load_post(&state, &post_id).await?;

    let text = validate_input(input, false)?.unwrap_or_default();
    let comment = state
        .storage
        .create_comment(&NewComment {
            post: post.id,
            author: author.id,
            text,
        })
        .await?;

    tracing::info!(post = %post.id, comment = %comment.id, "comment created");
    Ok((StatusCode::CREATED, Json(CommentRepr::from(comment))))
}

pub async fn get_comment(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath((post_id, id)): AppPath<(String, String)>,
) -> Result<Json<CommentRepr>, AppError> {
    POLICY.check_request(user.as_ref(), Action::Retrieve)?;
    let comment = load_comment(&state, &post_id, &id).await?;
    POLICY.check_object(user.as_ref(), Action::Retrieve, &comment)?;
    Ok(Json(CommentRepr::from(comment)))
}

pub async fn replace_comment(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath((post_id, id)): AppPath<(String, String)>,
    AppJson(input): AppJson<CommentInput>,
) -> Result<Json<CommentRepr>, AppError> {
    update(state, user, (&post_id, &id), input, false).await
}

pub async fn patch_comment(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath((post_id, id)): AppPath<(String, String)>,
    AppJson(input): AppJson<CommentInput>,
) -> Result<Json<CommentRepr>, AppError> {
    update(state, user, (&post_id, &id), input, true).await
}

pub async fn delete_comment(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath((post_id, id)): AppPath<(String, String)>,
) -> Result<StatusCode, AppError> {
    POLICY.check_request(user.as_ref(), Action::Delete)?;
    let comment = load_comment(&state, &post_id, &id).await?;
    POLICY.check_object(user.as_ref(), Action::Delete, &comment)?;

    state.storage.delete_comment(comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update(
    state: AppState,
    user: Option<User>,
    (post_id, id): (&str, &str),
    input: CommentInput,
    partial: bool,
) -> Result<Json<CommentRepr>, AppError> {
    POLICY.check_request(user.as_ref(), Action::Update)?;
    let comment = load_comment(&state, post_id, id).await?;
    POLICY.check_object(user.as_ref(), Action::Update, &comment)?;

    let updated = match validate_input(input, partial)? {
        Some(text) => state.storage.update_comment(comment.id, &text).await?,
        None => comment,
    };
    Ok(Json(CommentRepr::from(updated)))
}

async fn load_post(state: &AppState, raw_id: &str) -> Result<Post, AppError> {
    let id: PostId = parse_id(raw_id, "post")?;
    state
        .storage
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {id}")))
}

async fn load_comment(state: &AppState, post_id: &str, raw_id: &str) -> Result<Comment, AppError> {
    let post = load_post(state, post_id).await?;
    let id: CommentId = parse_id(raw_id, "comment")?;
    state
        .storage
        .get_comment(post.id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("comment {id}")))
}

/// The new comment text, or `None` for a partial update that leaves it alone.
fn validate_input(input: CommentInput, partial: bool) -> Result<Option<String>, FieldErrors> {
    match input.text {
        Some(Some(text)) => {
            validate_text(&text).map_err(|e| FieldErrors::single("text", e))?;
            Ok(Some(text))
        }
        Some(None) => Err(FieldErrors::single("text", ValidationError::Null)),
        None if partial => Ok(None),
        None => Err(FieldErrors::single("text", ValidationError::Required)),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::handlers::test_support::TestApp;

    async fn post_by(app: &TestApp, token: &str) -> Value {
        let (status, post) = app
            .send("POST", "/api/v1/posts/", Some(token), Some(json!({ "text": "p" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        post
    }

    #[tokio::test]
    async fn comment_post_comes_from_path() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        let p1 = post_by(&app, &alice).await;
        let p2 = post_by(&app, &alice).await;

        let url = format!("/api/v1/posts/{}/comments/", p1["id"]);
        let (status, body) = app
            .send("POST", &url, Some(&alice), Some(json!({ "text": "nice", "post": p2["id"] })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["post"], p1["id"]);
        assert_eq!(body["author"], "alice");

        let (status, list) = app.send("GET", &url, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let other = format!("/api/v1/posts/{}/comments/", p2["id"]);
        let (_, list) = app.send("GET", &other, None, None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn missing_parent_post_is_404() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;

        let (status, _) = app.send("GET", "/api/v1/posts/9/comments/", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app
            .send("POST", "/api/v1/posts/9/comments/", Some(&alice), Some(json!({ "text": "x" })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app
            .send("POST", "/api/v1/posts/9/comments/", None, Some(json!({ "text": "x" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn null_text_is_rejected() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        let post = post_by(&app, &alice).await;
        let url = format!("/api/v1/posts/{}/comments/", post["id"]);

        let (status, body) = app
            .send("POST", &url, Some(&alice), Some(json!({ "text": null })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"]["text"][0], "This field may not be null.");

        let (_, c) = app
            .send("POST", &url, Some(&alice), Some(json!({ "text": "c" })))
            .await;
        let (status, body) = app
            .send(
                "PATCH",
                &format!("{url}{}/", c["id"]),
                Some(&alice),
                Some(json!({ "text": null })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"]["text"][0], "This field may not be null.");
    }

    #[tokio::test]
    async fn comment_of_another_post_is_404() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        let p1 = post_by(&app, &alice).await;
        let p2 = post_by(&app, &alice).await;

        let (_, c) = app
            .send(
                "POST",
                &format!("/api/v1/posts/{}/comments/", p1["id"]),
                Some(&alice),
                Some(json!({ "text": "c" })),
            )
            .await;

        let (status, _) = app
            .send("GET", &format!("/api/v1/posts/{}/comments/{}/", p2["id"], c["id"]), None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app
            .send("GET", &format!("/api/v1/posts/{}/comments/{}/", p1["id"], c["id"]), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn only_the_author_may_modify() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        let (_, bob) = app.user("bob").await;
        let post = post_by(&app, &alice).await;

        let (_, c) = app
            .send(
                "POST",
                &format!("/api/v1/posts/{}/comments/", post["id"]),
                Some(&bob),
                Some(json!({ "text": "bob was here" })),
            )
            .await;
        let url = format!("/api/v1/posts/{}/comments/{}/", post["id"], c["id"]);

        // The post author does not own comments on it.
        let (status, _) = app
            .send("PATCH", &url, Some(&alice), Some(json!({ "text": "censored" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send("DELETE", &url, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .send("PUT", &url, Some(&bob), Some(json!({ "text": "edited" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "edited");

        let (status, body) = app.send("PUT", &url, Some(&bob), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"]["text"][0], "This field is required.");

        let (status, _) = app.send("DELETE", &url, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
