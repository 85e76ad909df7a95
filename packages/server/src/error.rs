//! Application-level error type returned by handlers.
//!
//! All variants serialise to the [`ErrorResponse`] JSON format and map to the
//! appropriate HTTP status code.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query,
    },
    http::{header::WWW_AUTHENTICATE, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use yatube::{Denial, FieldErrors};
use yatube_api::{error::codes, ErrorResponse};

use crate::{password::PasswordError, storage::StorageError, tokens::TokenError};

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// The request body is not valid JSON for the expected shape.
    InvalidJson(String),
    Validation(FieldErrors),
    /// No credentials were presented, or the presented ones were rejected at login.
    NotAuthenticated(String),
    /// A bearer token was presented but is invalid, expired or of the wrong type.
    TokenInvalid(String),
    Forbidden(String),
    MethodNotAllowed,
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(codes::NOT_FOUND, msg)),
            AppError::InvalidJson(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(codes::INVALID_JSON, msg))
            }
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::validation(errors))
            }
            AppError::NotAuthenticated(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(codes::NOT_AUTHENTICATED, msg),
            ),
            AppError::TokenInvalid(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(codes::TOKEN_NOT_VALID, msg),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse::new(codes::FORBIDDEN, msg)),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorResponse::new(codes::METHOD_NOT_ALLOWED, "method not allowed"),
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(codes::INTERNAL_ERROR, "internal server error"),
                )
            }
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BEARER_CHALLENGE));
        }
        response
    }
}

/// Challenge sent with every 401.
const BEARER_CHALLENGE: &str = r#"Bearer realm="api""#;

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => AppError::NotFound("not found".into()),
            // Handlers pre-check the constraints they know about; a conflict
            // reaching this point lost a race with a concurrent write.
            StorageError::Conflict(detail) => {
                tracing::debug!(%detail, "storage constraint rejected write");
                AppError::Validation(FieldErrors::non_field(
                    "This object conflicts with an existing one.",
                ))
            }
            StorageError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<Denial> for AppError {
    fn from(d: Denial) -> Self {
        match d {
            Denial::NotAuthenticated => AppError::NotAuthenticated(d.to_string()),
            Denial::Forbidden => AppError::Forbidden(d.to_string()),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(e: FieldErrors) -> Self {
        AppError::Validation(e)
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Encode(msg) => AppError::Internal(msg),
            other => {
                tracing::debug!(error = %other, "rejected token");
                AppError::TokenInvalid("token is invalid or expired".into())
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidJson(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            // Undecodable segments (bad UTF-8 and the like) cannot name an object.
            PathRejection::FailedToDeserializePathParams(e) => {
                AppError::NotFound(format!("not found: {}", e.body_text()))
            }
            other => AppError::Internal(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(FieldErrors::non_field(rejection.body_text()))
    }
}

/// `Json` extractor whose rejection is an [`AppError`], so malformed bodies
/// get the standard error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` extractor whose rejection is an [`AppError`]. Segments that do not
/// decode are reported as not found.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Query-string extractor whose rejection is an [`AppError`].
///
/// A key given more than once takes its last value, so `?limit=1&limit=2`
/// reads as `limit=2`. Every value arrives as a JSON string, so `T` should
/// declare its fields as strings.
#[derive(Debug)]
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        let params: Map<String, Value> = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        serde_json::from_value(Value::Object(params))
            .map(AppQuery)
            .map_err(|e| AppError::Validation(FieldErrors::non_field(e)))
    }
}
