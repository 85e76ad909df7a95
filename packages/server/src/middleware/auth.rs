//! Bearer-token authentication extractor.
//!
//! [`OptionalAuth`] resolves the `Authorization` header to the requesting
//! [`User`]:
//!
//! - no header, or a scheme other than `Bearer` → anonymous (`None`);
//! - `Bearer <access token>` for an existing user → `Some(user)`;
//! - any other `Bearer` credential → 401, even on read-only routes.
//!
//! Whether anonymous access is allowed is decided afterwards by the handler
//! through [`yatube::Policy`], so there is only one extractor.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use yatube::User;

use crate::{error::AppError, handlers::AppState};

const BEARER: &str = "Bearer";

/// The requesting user, if the request carried a valid access token.
pub struct OptionalAuth(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts).map(str::to_string);
        async move {
            let Some(token) = token else {
                return Ok(OptionalAuth(None));
            };
            let claims = app_state.tokens.decode_access(&token).map_err(|e| {
                tracing::warn!(error = %e, "rejected bearer token");
                AppError::from(e)
            })?;
            match app_state.storage.get_user(claims.user_id).await? {
                Some(user) => {
                    tracing::debug!(user = %user.username, "authenticated request");
                    Ok(OptionalAuth(Some(user)))
                }
                None => {
                    tracing::warn!(user_id = %claims.user_id, "token for unknown user");
                    Err(AppError::TokenInvalid("user not found".into()))
                }
            }
        }
    }
}

/// The token of a `Bearer` authorization header. Other schemes and
/// non-ASCII header values are ignored.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut split = value.trim().splitn(2, char::is_whitespace);
    let scheme = split.next()?;
    if scheme != BEARER {
        return None;
    }
    Some(split.next().unwrap_or("").trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = auth {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(None)), None);
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        // An empty Bearer credential is still a Bearer header and must fail
        // token validation rather than fall back to anonymous.
        assert_eq!(bearer_token(&parts(Some("Bearer"))), Some(""));
    }
}
