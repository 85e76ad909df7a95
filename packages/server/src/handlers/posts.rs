//! Post handlers.
//!
//! - `GET    /api/v1/posts/`: list posts, paged when `?limit=` is given.
//! - `POST   /api/v1/posts/`: create a post authored by the requester.
//! - `GET    /api/v1/posts/{id}/`: retrieve one post.
//! - `PUT    /api/v1/posts/{id}/`: full update (author only).
//! - `PATCH  /api/v1/posts/{id}/`: partial update (author only).
//! - `DELETE /api/v1/posts/{id}/`: delete the post and its comments (author only).

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use yatube::{
    validation::validate_text, Action, Denial, FieldErrors, GroupId, Policy, Post, PostId,
    User, ValidationError,
};
use yatube_api::{LimitOffsetQuery, Paginated, PostInput, PostRepr};

use crate::{
    error::{AppError, AppJson, AppPath, AppQuery},
    middleware::auth::OptionalAuth,
    storage::{NewPost, PostChanges},
};

use super::{parse_id, AppState};

const POLICY: Policy = Policy::AuthorOrReadOnly;

/// `GET /api/v1/posts/`
///
/// Returns a bare array unless a positive integer `limit` is supplied, in
/// which case the [`Paginated`] envelope is returned.
pub async fn list_posts(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    OriginalUri(uri): OriginalUri,
    AppQuery(query): AppQuery<LimitOffsetQuery>,
) -> Result<Response, AppError> {
    POLICY.check_request(user.as_ref(), Action::List)?;

    let window = query.window();
    let (posts, count) = state.storage.list_posts(window).await?;
    let results: Vec<PostRepr> = posts.into_iter().map(PostRepr::from).collect();

    Ok(match window {
        Some(window) => {
            let page_url = state.absolute_url(uri.path());
            Json(Paginated::new(results, count, window, &page_url)).into_response()
        }
        None => Json(results).into_response(),
    })
}

/// `POST /api/v1/posts/`
pub async fn create_post(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppJson(input): AppJson<PostInput>,
) -> Result<impl IntoResponse, AppError> {
    POLICY.check_request(user.as_ref(), Action::Create)?;
    let author = user.ok_or(Denial::NotAuthenticated)?;

    let changes = validate_input(&state, input, false).await?;
    let post = state
        .storage
        .create_post(&NewPost {
            author: author.id,
            text: changes.text.unwrap_or_default(),
            image: changes.image.flatten(),
            group: changes.group.flatten(),
        })
        .await?;

    tracing::info!(post = %post.id, author = %author.username, "post created");
    Ok((StatusCode::CREATED, Json(PostRepr::from(post))))
}

/// `GET /api/v1/posts/{id}/`
pub async fn get_post(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath(id): AppPath<String>,
) -> Result<Json<PostRepr>, AppError> {
    POLICY.check_request(user.as_ref(), Action::Retrieve)?;
    let post = load_post(&state, &id).await?;
    POLICY.check_object(user.as_ref(), Action::Retrieve, &post)?;
    Ok(Json(PostRepr::from(post)))
}

/// `PUT /api/v1/posts/{id}/`
pub async fn replace_post(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<PostInput>,
) -> Result<Json<PostRepr>, AppError> {
    update(state, user, &id, input, false).await
}

/// `PATCH /api/v1/posts/{id}/`
pub async fn patch_post(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<PostInput>,
) -> Result<Json<PostRepr>, AppError> {
    update(state, user, &id, input, true).await
}

/// `DELETE /api/v1/posts/{id}/`
pub async fn delete_post(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath(id): AppPath<String>,
) -> Result<StatusCode, AppError> {
    POLICY.check_request(user.as_ref(), Action::Delete)?;
    let post = load_post(&state, &id).await?;
    POLICY.check_object(user.as_ref(), Action::Delete, &post)?;

    state.storage.delete_post(post.id).await?;
    tracing::info!(post = %post.id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn update(
    state: AppState,
    user: Option<User>,
    raw_id: &str,
    input: PostInput,
    partial: bool,
) -> Result<Json<PostRepr>, AppError> {
    POLICY.check_request(user.as_ref(), Action::Update)?;
    let post = load_post(&state, raw_id).await?;
    POLICY.check_object(user.as_ref(), Action::Update, &post)?;

    let changes = validate_input(&state, input, partial).await?;
    let updated = state.storage.update_post(post.id, &changes).await?;
    Ok(Json(PostRepr::from(updated)))
}

async fn load_post(state: &AppState, raw_id: &str) -> Result<Post, AppError> {
    let id: PostId = parse_id(raw_id, "post")?;
    state
        .storage
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {id}")))
}

/// Check a post body and turn it into storage changes.
///
/// `text` is required unless `partial` and is never null. A non-null `group` must name an
/// existing group. Fields absent from the body are left untouched.
async fn validate_input(
    state: &AppState,
    input: PostInput,
    partial: bool,
) -> Result<PostChanges, AppError> {
    let mut errors = FieldErrors::new();

    let text = match input.text {
        Some(Some(text)) => errors.check("text", validate_text(&text)).map(|()| text),
        Some(None) => {
            errors.add("text", ValidationError::Null);
            None
        }
        None if partial => None,
        None => {
            errors.add("text", ValidationError::Required);
            None
        }
    };

    if let Some(Some(group)) = input.group {
        if state.storage.get_group(group).await?.is_none() {
            errors.add("group", invalid_pk(group));
        }
    }

    errors.into_result()?;
    Ok(PostChanges {
        text,
        image: input.image,
        group: input.group,
    })
}

fn invalid_pk(id: GroupId) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::handlers::test_support::TestApp;
    use crate::storage::NewGroup;

    #[tokio::test]
    async fn anonymous_can_read_but_not_write() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/v1/posts/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = app
            .send("POST", "/api/v1/posts/", None, Some(json!({ "text": "hi" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "not_authenticated");
    }

    #[tokio::test]
    async fn author_is_the_requester() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/posts/",
                Some(&token),
                Some(json!({ "text": "hi", "author": "mallory", "id": 99 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["author"], "alice");
        assert_eq!(body["text"], "hi");
        assert_ne!(body["id"], 99);
        assert!(body["image"].is_null());
        assert!(body["group"].is_null());
    }

    #[tokio::test]
    async fn create_requires_text_and_existing_group() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;

        let (status, body) = app
            .send("POST", "/api/v1/posts/", Some(&token), Some(json!({ "group": 5 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"]["text"][0], "This field is required.");
        assert_eq!(
            body["fields"]["group"][0],
            "Invalid pk \"5\" - object does not exist."
        );

        let (status, body) = app
            .send("POST", "/api/v1/posts/", Some(&token), Some(json!({ "text": "  " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"]["text"][0], "This field may not be blank.");
    }

    #[tokio::test]
    async fn post_in_group() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;
        let group = app
            .storage
            .create_group(&NewGroup {
                title: "Cats".into(),
                slug: "cats".into(),
                description: String::new(),
            })
            .await
            .unwrap();

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/posts/",
                Some(&token),
                Some(json!({ "text": "meow", "group": group.id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["group"], group.id.0);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/posts/")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let resp = tower::ServiceExt::oneshot(app.router.clone(), req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_the_author_may_modify() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        let (_, bob) = app.user("bob").await;

        let (_, post) = app
            .send("POST", "/api/v1/posts/", Some(&alice), Some(json!({ "text": "hi" })))
            .await;
        let url = format!("/api/v1/posts/{}/", post["id"]);

        let (status, _) = app
            .send("PATCH", &url, Some(&bob), Some(json!({ "text": "pwned" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send("DELETE", &url, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app
            .send("PATCH", &url, None, Some(json!({ "text": "anon" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .send("PATCH", &url, Some(&alice), Some(json!({ "text": "edited" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "edited");
        assert_eq!(body["pub_date"], post["pub_date"]);

        let (status, _) = app.send("DELETE", &url, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send("GET", &url, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_requires_text_patch_does_not() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        let (_, post) = app
            .send(
                "POST",
                "/api/v1/posts/",
                Some(&alice),
                Some(json!({ "text": "hi", "image": "posts/a.png" })),
            )
            .await;
        let url = format!("/api/v1/posts/{}/", post["id"]);

        let (status, body) = app
            .send("PUT", &url, Some(&alice), Some(json!({ "image": null })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["text"].is_array());

        let (status, body) = app
            .send("PATCH", &url, Some(&alice), Some(json!({ "image": null })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["image"].is_null());
        assert_eq!(body["text"], "hi");
    }

    #[tokio::test]
    async fn null_text_is_rejected() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        let (_, post) = app
            .send("POST", "/api/v1/posts/", Some(&alice), Some(json!({ "text": "hi" })))
            .await;
        let url = format!("/api/v1/posts/{}/", post["id"]);

        for method in ["PATCH", "PUT"] {
            let (status, body) = app
                .send(method, &url, Some(&alice), Some(json!({ "text": null })))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
            assert_eq!(body["fields"]["text"][0], "This field may not be null.");
        }
        let (status, body) = app
            .send("POST", "/api/v1/posts/", Some(&alice), Some(json!({ "text": null })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"]["text"][0], "This field may not be null.");

        let (_, body) = app.send("GET", &url, None, None).await;
        assert_eq!(body["text"], "hi");
    }

    #[tokio::test]
    async fn undecodable_id_is_json_404() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/v1/posts/%FF/", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");

        let (status, body) = app
            .send("GET", "/api/v1/posts/%FF/comments/", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn repeated_query_key_takes_last_value() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        for i in 0..3 {
            app.send(
                "POST",
                "/api/v1/posts/",
                Some(&alice),
                Some(json!({ "text": format!("post {i}") })),
            )
            .await;
        }

        let (status, body) = app
            .send("GET", "/api/v1/posts/?limit=1&limit=2", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_posts_and_odd_ids() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;

        let (status, _) = app.send("GET", "/api/v1/posts/42/", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.send("GET", "/api/v1/posts/abc/", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Request-level permission is checked before the lookup.
        let (status, _) = app
            .send("PATCH", "/api/v1/posts/42/", None, Some(json!({ "text": "x" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = app
            .send("PATCH", "/api/v1/posts/42/", Some(&alice), Some(json!({ "text": "x" })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn limit_offset_pagination() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice").await;
        for i in 0..5 {
            app.send(
                "POST",
                "/api/v1/posts/",
                Some(&alice),
                Some(json!({ "text": format!("post {i}") })),
            )
            .await;
        }

        let (status, body) = app.send("GET", "/api/v1/posts/?limit=2&offset=2", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 5);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"][0]["text"], "post 2");
        assert_eq!(
            body["next"],
            "http://127.0.0.1:8000/api/v1/posts/?limit=2&offset=4"
        );
        assert_eq!(body["previous"], "http://127.0.0.1:8000/api/v1/posts/?limit=2");

        let (_, body) = app.send("GET", "/api/v1/posts/?limit=2&offset=4", None, None).await;
        assert!(body["next"].is_null());
        assert_eq!(body["results"].as_array().unwrap().len(), 1);

        let (_, body) = app.send("GET", "/api/v1/posts/?limit=zero", None, None).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn bad_bearer_token_is_401_even_for_reads() {
        let app = TestApp::new();
        let (status, body) = app
            .send("GET", "/api/v1/posts/", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "token_not_valid");
    }
}
