//! Storage abstraction layer for the Yatube server.
//!
//! The [`Storage`] trait defines the contract between the HTTP handler layer
//! and persistence. All permission logic lives in the handlers; storage is
//! purely a data access layer. The only rules it enforces itself are the
//! relational ones: unique usernames, unique group slugs, unique and
//! irreflexive follow edges, and cascading deletes.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStorage`] | Tests, conformance suite, ephemeral servers |
//! | [`SqliteStorage`] | Production; durable single-file database |
//!
//! [`MemoryStorage`]: memory::MemoryStorage
//! [`SqliteStorage`]: sqlite::SqliteStorage

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use yatube::{Comment, CommentId, Follow, Group, GroupId, Post, PostId, User, UserId};
use yatube_api::PageWindow;

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors that storage operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested item does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness or integrity constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An unexpected error in the underlying storage backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Write models
// ---------------------------------------------------------------------------

/// Fields of a group to insert.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Fields of a post to insert. `pub_date` is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author: UserId,
    pub text: String,
    pub image: Option<String>,
    pub group: Option<GroupId>,
}

/// Changes to apply to an existing post. `None` leaves a field untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub text: Option<String>,
    pub image: Option<Option<String>>,
    pub group: Option<Option<GroupId>>,
}

/// Fields of a comment to insert. `created` is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post: PostId,
    pub author: UserId,
    pub text: String,
}

// ---------------------------------------------------------------------------
// FollowFilter
// ---------------------------------------------------------------------------

/// Query parameters for [`Storage::list_follows`].
///
/// Handlers always set `user` to the requester, which is what keeps one
/// user's follow edges invisible to everybody else.
#[derive(Debug, Clone)]
pub struct FollowFilter {
    /// Include only edges whose follower is this user.
    pub user: UserId,

    /// Include only edges whose followed username contains every one of these
    /// terms, compared case-insensitively. Empty means no filtering.
    pub search_terms: Vec<String>,
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// The persistence contract for the Yatube server.
///
/// All methods are `async` and return `Result<_, StorageError>`. Implementations
/// must be `Send + Sync + 'static` so they can be held in an `Arc<dyn Storage>`.
/// Every list is ordered by ascending id.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    // --- Users ---------------------------------------------------------------

    /// Create an account. Returns [`StorageError::Conflict`] if the username
    /// is taken.
    async fn create_user(&self, username: &str, password_hash: &str)
        -> Result<User, StorageError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Return the user together with their stored password hash. Only the
    /// login path should need this.
    async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, StorageError>;

    // --- Groups --------------------------------------------------------------

    /// Create a group. Returns [`StorageError::Conflict`] if the slug is taken.
    async fn create_group(&self, group: &NewGroup) -> Result<Group, StorageError>;

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, StorageError>;

    async fn list_groups(&self) -> Result<Vec<Group>, StorageError>;

    // --- Posts ---------------------------------------------------------------

    async fn create_post(&self, post: &NewPost) -> Result<Post, StorageError>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError>;

    /// Return the posts inside `window` (all of them when `None`) together
    /// with the total number of posts.
    async fn list_posts(
        &self,
        window: Option<PageWindow>,
    ) -> Result<(Vec<Post>, u64), StorageError>;

    /// Apply `changes` and return the updated post, or
    /// [`StorageError::NotFound`].
    async fn update_post(&self, id: PostId, changes: &PostChanges)
        -> Result<Post, StorageError>;

    /// Delete a post and its comments. Returns [`StorageError::NotFound`] if
    /// the post does not exist.
    async fn delete_post(&self, id: PostId) -> Result<(), StorageError>;

    // --- Comments ------------------------------------------------------------

    /// Returns [`StorageError::NotFound`] if the parent post does not exist.
    async fn create_comment(&self, comment: &NewComment) -> Result<Comment, StorageError>;

    /// Look up a comment under a given post; a comment of another post is `None`.
    async fn get_comment(
        &self,
        post: PostId,
        id: CommentId,
    ) -> Result<Option<Comment>, StorageError>;

    async fn list_comments(&self, post: PostId) -> Result<Vec<Comment>, StorageError>;

    async fn update_comment(&self, id: CommentId, text: &str) -> Result<Comment, StorageError>;

    async fn delete_comment(&self, id: CommentId) -> Result<(), StorageError>;

    // --- Follows -------------------------------------------------------------

    /// Record that `user` follows `following`.
    ///
    /// Returns [`StorageError::Conflict`] for a duplicate edge or a self-follow.
    async fn create_follow(
        &self,
        user: UserId,
        following: UserId,
    ) -> Result<Follow, StorageError>;

    /// Return `true` if `user` follows `following`.
    async fn follow_exists(&self, user: UserId, following: UserId) -> Result<bool, StorageError>;

    async fn list_follows(&self, filter: &FollowFilter) -> Result<Vec<Follow>, StorageError>;
}

/// Case-insensitive "contains every term" match used by follow search.
pub(crate) fn matches_terms(username: &str, terms: &[String]) -> bool {
    let haystack = username.to_lowercase();
    terms
        .iter()
        .all(|term| haystack.contains(&term.to_lowercase()))
}
