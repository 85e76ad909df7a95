//! Comment representation and input: `/posts/{post_id}/comments/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use yatube::{Comment, CommentId, PostId};

/// The external representation of a [`Comment`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentRepr {
    pub id: CommentId,
    /// Username of the author.
    pub author: String,
    /// Parent post; read-only, taken from the URL.
    pub post: PostId,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl From<Comment> for CommentRepr {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            author: c.author.username,
            post: c.post,
            text: c.text,
            created: c.created,
        }
    }
}

/// Body of comment create/update requests. A `post` key in the body is
/// ignored; the parent post always comes from the path. An explicit
/// `"text": null` is kept apart from a missing key as `Some(None)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommentInput {
    #[serde(
        default,
        deserialize_with = "crate::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<Option<String>>,
}
