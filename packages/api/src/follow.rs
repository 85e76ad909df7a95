//! Follow-edge types: `GET /follow/` and `POST /follow/`.
//!
//! A follow edge is always owned by the requester: the `user` side is filled
//! in from the authenticated principal and cannot be chosen by the client.

use serde::{Deserialize, Serialize};
use yatube::{Follow, FollowId};

/// The external representation of a [`Follow`] edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowRepr {
    pub id: FollowId,
    /// Username of the follower (always the requester).
    pub user: String,
    /// Username of the followed account.
    pub following: String,
}

impl From<Follow> for FollowRepr {
    fn from(f: Follow) -> Self {
        Self {
            id: f.id,
            user: f.user.username,
            following: f.following.username,
        }
    }
}

/// Body of `POST /follow/`. A `user` key is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowInput {
    /// Username to follow. `Some(None)` is an explicit `null`.
    #[serde(default, deserialize_with = "crate::double_option")]
    pub following: Option<Option<String>>,
}

/// Query parameters for `GET /follow/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowQuery {
    /// Substring filter over the followed username.
    #[serde(default)]
    pub search: Option<String>,
}

impl FollowQuery {
    /// Split the search value into terms on whitespace and commas.
    ///
    /// Every term must match for an edge to be listed; an absent or blank
    /// search yields no terms, i.e. no filtering.
    pub fn terms(&self) -> Vec<String> {
        self.search
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}
