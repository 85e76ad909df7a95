//! Post representation and input: `/posts/` and `/posts/{id}/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use yatube::{GroupId, Post, PostId};

/// The external representation of a [`Post`].
///
/// ```json
/// { "id": 1, "text": "hi", "pub_date": "2024-05-01T10:00:00Z",
///   "author": "alice", "image": null, "group": 2 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostRepr {
    pub id: PostId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    /// Username of the author.
    pub author: String,
    pub image: Option<String>,
    pub group: Option<GroupId>,
}

impl From<&Post> for PostRepr {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            author: post.author.username.clone(),
            image: post.image.clone(),
            group: post.group,
        }
    }
}

impl From<Post> for PostRepr {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            text: post.text,
            pub_date: post.pub_date,
            author: post.author.username,
            image: post.image,
            group: post.group,
        }
    }
}

/// Body of `POST /posts/`, `PUT /posts/{id}/` and `PATCH /posts/{id}/`.
///
/// Only client-writable fields appear here; `id`, `author` and `pub_date`
/// in a request body are ignored. For every field an absent key is `None`
/// and an explicit `null` is `Some(None)`; `text` may not be null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostInput {
    #[serde(
        default,
        deserialize_with = "crate::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<Option<String>>,

    #[serde(
        default,
        deserialize_with = "crate::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<Option<String>>,

    #[serde(
        default,
        deserialize_with = "crate::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub group: Option<Option<GroupId>>,
}
