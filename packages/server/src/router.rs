//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    error::AppError,
    handlers::{comments, follows, groups, jwt, posts, AppState},
    storage::Storage,
};

/// Build the complete application router with shared state.
///
/// Every route lives under `/api/v1/` and ends with a slash.
pub fn build_router(storage: Arc<dyn Storage>, config: ServerConfig) -> Router {
    let state = AppState::new(storage, config);

    Router::new()
        // Posts
        .route(
            "/api/v1/posts/",
            get(posts::list_posts).post(posts::create_post),
        )
        .route(
            "/api/v1/posts/{id}/",
            get(posts::get_post)
                .put(posts::replace_post)
                .patch(posts::patch_post)
                .delete(posts::delete_post),
        )
        // Comments
        .route(
            "/api/v1/posts/{post_id}/comments/",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/v1/posts/{post_id}/comments/{id}/",
            get(comments::get_comment)
                .put(comments::replace_comment)
                .patch(comments::patch_comment)
                .delete(comments::delete_comment),
        )
        // Groups
        .route("/api/v1/groups/", get(groups::list_groups))
        .route("/api/v1/groups/{id}/", get(groups::get_group))
        // Follows
        .route(
            "/api/v1/follow/",
            get(follows::list_follows).post(follows::create_follow),
        )
        // Tokens
        .route("/api/v1/jwt/create/", post(jwt::create_token))
        .route("/api/v1/jwt/refresh/", post(jwt::refresh_token))
        .route("/api/v1/jwt/verify/", post(jwt::verify_token))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".into())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::handlers::test_support::TestApp;

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/v1/nope/", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn follow_edges_cannot_be_deleted() {
        let app = TestApp::new();
        let (_, token) = app.user("alice").await;
        let (status, _) = app.send("DELETE", "/api/v1/follow/", Some(&token), None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
