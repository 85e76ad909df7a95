//! Core entities of the blog: users, groups, posts, comments and follow edges.
//!
//! Ids are `i64` newtypes so a post id can never be passed where a user id is
//! expected. They serialise transparently as JSON integers.
//!
//! Related records are carried already joined: a [`Post`] holds its author as
//! a [`User`] rather than a bare id, because every representation of a post
//! needs the author's username.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        /// Parses a positive decimal id as it appears in a URL path segment.
        impl std::str::FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.parse::<i64>() {
                    Ok(n) if n > 0 => Ok($name(n)),
                    _ => Err(format!("{s:?} is not a valid {}", stringify!($name))),
                }
            }
        }

        impl From<i64> for $name {
            fn from(n: i64) -> Self {
                $name(n)
            }
        }
    };
}

id_newtype!(
    /// Primary key of a [`User`].
    UserId
);
id_newtype!(
    /// Primary key of a [`Group`].
    GroupId
);
id_newtype!(
    /// Primary key of a [`Post`].
    PostId
);
id_newtype!(
    /// Primary key of a [`Comment`].
    CommentId
);
id_newtype!(
    /// Primary key of a [`Follow`] edge.
    FollowId
);

/// An account that can author posts and comments and follow other accounts.
///
/// The password hash is deliberately not part of this type; storage hands it
/// out separately and only to the login path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// A topic category that posts may optionally belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    /// Unique, URL-safe identifier.
    pub slug: String,
    pub description: String,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub text: String,
    /// Set once, when the post is created.
    pub pub_date: DateTime<Utc>,
    pub author: User,
    /// Reference to an attached image (path or URL), if any.
    pub image: Option<String>,
    pub group: Option<GroupId>,
}

/// A comment attached to exactly one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Fixed at creation; no operation moves a comment to another post.
    pub post: PostId,
    pub author: User,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// A directed follow edge: `user` follows `following`.
///
/// Edges are irreflexive (`user != following`) and unique per ordered pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: FollowId,
    pub user: User,
    pub following: User,
}
