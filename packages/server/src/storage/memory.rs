//! In-memory storage implementation.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use this for tests, the conformance suite, and ephemeral servers.
//!
//! Rows are kept in [`BTreeMap`]s keyed by id, so iteration is already in
//! ascending id order and limit/offset windows are a `skip`/`take` away.
//! Rows reference each other by id and are joined on read, like the SQLite
//! backend.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use yatube::{
    Comment, CommentId, Follow, FollowId, Group, GroupId, Post, PostId, User, UserId,
};
use yatube_api::PageWindow;

use super::{
    matches_terms, FollowFilter, NewComment, NewGroup, NewPost, PostChanges, Storage,
    StorageError,
};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct UserRow {
    username: String,
    password_hash: String,
}

struct PostRow {
    text: String,
    pub_date: DateTime<Utc>,
    author: UserId,
    image: Option<String>,
    group: Option<GroupId>,
}

struct CommentRow {
    post: PostId,
    author: UserId,
    text: String,
    created: DateTime<Utc>,
}

struct FollowRow {
    user: UserId,
    following: UserId,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, UserRow>,
    groups: BTreeMap<GroupId, Group>,
    posts: BTreeMap<PostId, PostRow>,
    comments: BTreeMap<CommentId, CommentRow>,
    follows: BTreeMap<FollowId, FollowRow>,
    /// Last id handed out; ids are never reused, as with AUTOINCREMENT.
    last_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: UserId) -> Result<User, StorageError> {
        self.users
            .get(&id)
            .map(|row| User::new(id, row.username.clone()))
            .ok_or_else(|| StorageError::Internal(format!("dangling user reference {id}")))
    }

    fn post(&self, id: PostId, row: &PostRow) -> Result<Post, StorageError> {
        Ok(Post {
            id,
            text: row.text.clone(),
            pub_date: row.pub_date,
            author: self.user(row.author)?,
            image: row.image.clone(),
            group: row.group,
        })
    }

    fn comment(&self, id: CommentId, row: &CommentRow) -> Result<Comment, StorageError> {
        Ok(Comment {
            id,
            post: row.post,
            author: self.user(row.author)?,
            text: row.text.clone(),
            created: row.created,
        })
    }

    fn follow(&self, id: FollowId, row: &FollowRow) -> Result<Follow, StorageError> {
        Ok(Follow {
            id,
            user: self.user(row.user)?,
            following: self.user(row.following)?,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`Storage`].
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    // Every mutation is a single map insert or remove, so a poisoned lock
    // still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for MemoryStorage {
    // --- Users ---------------------------------------------------------------

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StorageError> {
        let mut inner = self.write();
        if inner.users.values().any(|u| u.username == username) {
            return Err(StorageError::Conflict(format!(
                "username {username:?} is already taken"
            )));
        }
        let id = UserId(inner.next_id());
        inner.users.insert(
            id,
            UserRow {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(User::new(id, username))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let inner = self.read();
        Ok(inner
            .users
            .get(&id)
            .map(|row| User::new(id, row.username.clone())))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.get_credentials(username).await?.map(|(user, _)| user))
    }

    async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, StorageError> {
        let inner = self.read();
        Ok(inner
            .users
            .iter()
            .find(|(_, row)| row.username == username)
            .map(|(id, row)| (User::new(*id, row.username.clone()), row.password_hash.clone())))
    }

    // --- Groups --------------------------------------------------------------

    async fn create_group(&self, group: &NewGroup) -> Result<Group, StorageError> {
        let mut inner = self.write();
        if inner.groups.values().any(|g| g.slug == group.slug) {
            return Err(StorageError::Conflict(format!(
                "group slug {:?} is already taken",
                group.slug
            )));
        }
        let id = GroupId(inner.next_id());
        let stored = Group {
            id,
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        };
        inner.groups.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, StorageError> {
        Ok(self.read().groups.get(&id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StorageError> {
        Ok(self.read().groups.values().cloned().collect())
    }

    // --- Posts ---------------------------------------------------------------

    async fn create_post(&self, post: &NewPost) -> Result<Post, StorageError> {
        let mut inner = self.write();
        if !inner.users.contains_key(&post.author) {
            return Err(StorageError::Conflict(format!("unknown author {}", post.author)));
        }
        if let Some(group) = post.group {
            if !inner.groups.contains_key(&group) {
                return Err(StorageError::Conflict(format!("unknown group {group}")));
            }
        }
        let id = PostId(inner.next_id());
        let row = PostRow {
            text: post.text.clone(),
            pub_date: Utc::now(),
            author: post.author,
            image: post.image.clone(),
            group: post.group,
        };
        let stored = inner.post(id, &row)?;
        inner.posts.insert(id, row);
        Ok(stored)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        let inner = self.read();
        inner
            .posts
            .get(&id)
            .map(|row| inner.post(id, row))
            .transpose()
    }

    async fn list_posts(
        &self,
        window: Option<PageWindow>,
    ) -> Result<(Vec<Post>, u64), StorageError> {
        let inner = self.read();
        let count = inner.posts.len() as u64;
        let (skip, take) = match window {
            Some(w) => (w.offset as usize, w.limit as usize),
            None => (0, usize::MAX),
        };
        let posts = inner
            .posts
            .iter()
            .skip(skip)
            .take(take)
            .map(|(id, row)| inner.post(*id, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((posts, count))
    }

    async fn update_post(
        &self,
        id: PostId,
        changes: &PostChanges,
    ) -> Result<Post, StorageError> {
        let mut inner = self.write();
        if let Some(Some(group)) = changes.group {
            if !inner.groups.contains_key(&group) {
                return Err(StorageError::Conflict(format!("unknown group {group}")));
            }
        }
        let row = inner.posts.get_mut(&id).ok_or(StorageError::NotFound)?;
        if let Some(text) = &changes.text {
            row.text = text.clone();
        }
        if let Some(image) = &changes.image {
            row.image = image.clone();
        }
        if let Some(group) = changes.group {
            row.group = group;
        }
        let inner = &*inner;
        let row = inner.posts.get(&id).ok_or(StorageError::NotFound)?;
        inner.post(id, row)
    }

    async fn delete_post(&self, id: PostId) -> Result<(), StorageError> {
        let mut inner = self.write();
        inner.posts.remove(&id).ok_or(StorageError::NotFound)?;
        inner.comments.retain(|_, c| c.post != id);
        Ok(())
    }

    // --- Comments ------------------------------------------------------------

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment, StorageError> {
        let mut inner = self.write();
        if !inner.posts.contains_key(&comment.post) {
            return Err(StorageError::NotFound);
        }
        let id = CommentId(inner.next_id());
        let row = CommentRow {
            post: comment.post,
            author: comment.author,
            text: comment.text.clone(),
            created: Utc::now(),
        };
        let stored = inner.comment(id, &row)?;
        inner.comments.insert(id, row);
        Ok(stored)
    }

    async fn get_comment(
        &self,
        post: PostId,
        id: CommentId,
    ) -> Result<Option<Comment>, StorageError> {
        let inner = self.read();
        inner
            .comments
            .get(&id)
            .filter(|row| row.post == post)
            .map(|row| inner.comment(id, row))
            .transpose()
    }

    async fn list_comments(&self, post: PostId) -> Result<Vec<Comment>, StorageError> {
        let inner = self.read();
        inner
            .comments
            .iter()
            .filter(|(_, row)| row.post == post)
            .map(|(id, row)| inner.comment(*id, row))
            .collect()
    }

    async fn update_comment(&self, id: CommentId, text: &str) -> Result<Comment, StorageError> {
        let mut inner = self.write();
        let row = inner.comments.get_mut(&id).ok_or(StorageError::NotFound)?;
        row.text = text.to_string();
        let inner = &*inner;
        let row = inner.comments.get(&id).ok_or(StorageError::NotFound)?;
        inner.comment(id, row)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), StorageError> {
        self.write()
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    // --- Follows -------------------------------------------------------------

    async fn create_follow(
        &self,
        user: UserId,
        following: UserId,
    ) -> Result<Follow, StorageError> {
        let mut inner = self.write();
        if user == following {
            return Err(StorageError::Conflict("a user cannot follow themselves".into()));
        }
        if inner
            .follows
            .values()
            .any(|f| f.user == user && f.following == following)
        {
            return Err(StorageError::Conflict(format!(
                "user {user} already follows user {following}"
            )));
        }
        let id = FollowId(inner.next_id());
        let row = FollowRow { user, following };
        let stored = inner.follow(id, &row)?;
        inner.follows.insert(id, row);
        Ok(stored)
    }

    async fn follow_exists(&self, user: UserId, following: UserId) -> Result<bool, StorageError> {
        Ok(self
            .read()
            .follows
            .values()
            .any(|f| f.user == user && f.following == following))
    }

    async fn list_follows(&self, filter: &FollowFilter) -> Result<Vec<Follow>, StorageError> {
        let inner = self.read();
        let mut result = Vec::new();
        for (id, row) in inner.follows.iter().filter(|(_, f)| f.user == filter.user) {
            let follow = inner.follow(*id, row)?;
            if matches_terms(&follow.following.username, &filter.search_terms) {
                result.push(follow);
            }
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
