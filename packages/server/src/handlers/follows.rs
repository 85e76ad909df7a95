//! Follow-edge handlers.
//!
//! - `GET  /api/v1/follow/`: list the requester's follow edges, optionally
//!   filtered with `?search=` over the followed username.
//! - `POST /api/v1/follow/`: follow another user.
//!
//! Both require authentication. The follower side of an edge is always the
//! requester, so nobody can list or create edges on behalf of someone else.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use yatube::{Action, Denial, FieldErrors, Policy, ValidationError};
use yatube_api::{FollowInput, FollowQuery, FollowRepr};

use crate::{
    error::{AppError, AppJson, AppQuery},
    middleware::auth::OptionalAuth,
    storage::FollowFilter,
};

use super::AppState;

const POLICY: Policy = Policy::Authenticated;

pub const ALREADY_FOLLOWING: &str = "You are already following this author.";
pub const CANNOT_FOLLOW_SELF: &str = "You cannot follow yourself.";

/// `GET /api/v1/follow/`
pub async fn list_follows(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppQuery(query): AppQuery<FollowQuery>,
) -> Result<Json<Vec<FollowRepr>>, AppError> {
    POLICY.check_request(user.as_ref(), Action::List)?;
    let user = user.ok_or(Denial::NotAuthenticated)?;

    let follows = state
        .storage
        .list_follows(&FollowFilter {
            user: user.id,
            search_terms: query.terms(),
        })
        .await?;
    Ok(Json(follows.into_iter().map(FollowRepr::from).collect()))
}

/// `POST /api/v1/follow/`
///
/// Returns 400 when `following` is missing or names no user, when the edge
/// already exists, or when the requester tries to follow themselves. The
/// duplicate check runs first.
pub async fn create_follow(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppJson(input): AppJson<FollowInput>,
) -> Result<impl IntoResponse, AppError> {
    POLICY.check_request(user.as_ref(), Action::Create)?;
    let user = user.ok_or(Denial::NotAuthenticated)?;

    let username = match input.following {
        Some(Some(name)) if name.is_empty() => {
            return Err(FieldErrors::single("following", ValidationError::Blank).into())
        }
        Some(Some(name)) => name,
        Some(None) => return Err(FieldErrors::single("following", ValidationError::Null).into()),
        None => return Err(FieldErrors::single("following", ValidationError::Required).into()),
    };
    let following = state
        .storage
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| {
            FieldErrors::single(
                "following",
                format!("Object with username={username} does not exist."),
            )
        })?;

    if state.storage.follow_exists(user.id, following.id).await? {
        return Err(FieldErrors::non_field(ALREADY_FOLLOWING).into());
    }
    if following.id == user.id {
        return Err(FieldErrors::non_field(CANNOT_FOLLOW_SELF).into());
    }

    let follow = state.storage.create_follow(user.id, following.id).await?;
    tracing::info!(user = %user.username, following = %following.username, "follow created");
    Ok((StatusCode::CREATED, Json(FollowRepr::from(follow))))
}
