//! Group handlers. Groups are read-only over HTTP; they are created with the
//! `yatube` admin CLI.
//!
//! - `GET /api/v1/groups/`
//! - `GET /api/v1/groups/{id}/`

use axum::{extract::State, Json};
use yatube::{Action, GroupId, Policy};
use yatube_api::GroupRepr;

use crate::{
    error::{AppError, AppPath},
    middleware::auth::OptionalAuth,
};

use super::{parse_id, AppState};

const POLICY: Policy = Policy::ReadOnly;

pub async fn list_groups(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Vec<GroupRepr>>, AppError> {
    POLICY.check_request(user.as_ref(), Action::List)?;
    let groups = state.storage.list_groups().await?;
    Ok(Json(groups.into_iter().map(GroupRepr::from).collect()))
}

pub async fn get_group(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    AppPath(id): AppPath<String>,
) -> Result<Json<GroupRepr>, AppError> {
    POLICY.check_request(user.as_ref(), Action::Retrieve)?;
    let id: GroupId = parse_id(&id, "group")?;
    let group = state
        .storage
        .get_group(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("group {id}")))?;
    Ok(Json(GroupRepr::from(group)))
}
