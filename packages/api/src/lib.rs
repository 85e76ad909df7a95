//! Request and response types for the Yatube HTTP API.
//!
//! This crate encodes the JSON contract of the `/api/v1/` routes as Rust
//! types. Representations are built from the domain types in the `yatube`
//! crate; input types describe what a client may send and deliberately omit
//! every server-assigned field.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | GET | `/posts/` | [`LimitOffsetQuery`] → `Vec<`[`PostRepr`]`>` or [`Paginated`] |
//! | POST | `/posts/` | [`PostInput`] → [`PostRepr`] |
//! | GET/PUT/PATCH | `/posts/{id}/` | [`PostInput`] → [`PostRepr`] |
//! | GET/POST | `/posts/{post_id}/comments/` | [`CommentInput`] → [`CommentRepr`] |
//! | GET/PUT/PATCH | `/posts/{post_id}/comments/{id}/` | [`CommentInput`] → [`CommentRepr`] |
//! | GET | `/groups/`, `/groups/{id}/` | → [`GroupRepr`] |
//! | GET | `/follow/` | [`FollowQuery`] → `Vec<`[`FollowRepr`]`>` |
//! | POST | `/follow/` | [`FollowInput`] → [`FollowRepr`] |
//! | POST | `/jwt/create/` | [`TokenObtainRequest`] → [`TokenPair`] |
//! | POST | `/jwt/refresh/` | [`TokenRefreshRequest`] → [`AccessToken`] |
//! | POST | `/jwt/verify/` | [`TokenVerifyRequest`] → `{}` |

pub mod auth;
pub mod comment;
pub mod error;
pub mod follow;
pub mod group;
pub mod pagination;
pub mod post;

pub use auth::{AccessToken, TokenObtainRequest, TokenPair, TokenRefreshRequest, TokenVerifyRequest};
pub use comment::{CommentInput, CommentRepr};
pub use error::ErrorResponse;
pub use follow::{FollowInput, FollowQuery, FollowRepr};
pub use group::GroupRepr;
pub use pagination::{LimitOffsetQuery, PageWindow, Paginated};
pub use post::{PostInput, PostRepr};

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Nullable fields use it to clear a value; the others to
/// reject `null` instead of treating it as missing.
///
/// Use together with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
