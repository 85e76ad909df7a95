//! SQLite-backed storage implementation.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! # Schema
//!
//! - `users`: accounts and their argon2 password hashes.
//! - `groups`: topic categories, unique by slug.
//! - `posts`: posts; deleting the author cascades, deleting the group nulls it.
//! - `comments`: comments; deleting the post or the author cascades.
//! - `follows`: (user, following) edges, unique and irreflexive.
//!
//! Timestamps are stored as RFC 3339 text in UTC.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use yatube::{
    Comment, CommentId, Follow, FollowId, Group, GroupId, Post, PostId, User, UserId,
};
use yatube_api::PageWindow;

use super::{
    matches_terms, FollowFilter, NewComment, NewGroup, NewPost, PostChanges, Storage,
    StorageError,
};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS groups (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS posts (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    text      TEXT NOT NULL,
    pub_date  TEXT NOT NULL,
    author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    image     TEXT,
    group_id  INTEGER REFERENCES groups(id) ON DELETE SET NULL
);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
CREATE INDEX IF NOT EXISTS idx_posts_group  ON posts(group_id);

CREATE TABLE IF NOT EXISTS comments (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id   INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    text      TEXT NOT NULL,
    created   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);

CREATE TABLE IF NOT EXISTS follows (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    following_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    UNIQUE (user_id, following_id),
    CHECK (user_id <> following_id)
);
CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id);
";

const POST_SELECT: &str = "
SELECT p.id, p.text, p.pub_date, p.author_id, u.username, p.image, p.group_id
FROM posts p JOIN users u ON u.id = p.author_id";

const COMMENT_SELECT: &str = "
SELECT c.id, c.post_id, c.author_id, u.username, c.text, c.created
FROM comments c JOIN users u ON u.id = c.author_id";

const FOLLOW_SELECT: &str = "
SELECT f.id, f.user_id, fu.username, f.following_id, tu.username
FROM follows f
JOIN users fu ON fu.id = f.user_id
JOIN users tu ON tu.id = f.following_id";

// ---------------------------------------------------------------------------
// SqliteStorage
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`Storage`].
///
/// Holds a single database connection protected by a `Mutex`. All operations
/// run inside `spawn_blocking` to avoid blocking the async runtime.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the SQLite database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread-pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StorageError::Internal("connection mutex poisoned".into()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StorageError::Internal(format!("task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Error and row conversions
// ---------------------------------------------------------------------------

fn map_err(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StorageError::Conflict(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        _ => StorageError::Internal(e.to_string()),
    }
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: PostId(row.get(0)?),
        text: row.get(1)?,
        pub_date: ts_column(row, 2)?,
        author: User::new(UserId(row.get(3)?), row.get::<_, String>(4)?),
        image: row.get(5)?,
        group: row.get::<_, Option<i64>>(6)?.map(GroupId),
    })
}

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: CommentId(row.get(0)?),
        post: PostId(row.get(1)?),
        author: User::new(UserId(row.get(2)?), row.get::<_, String>(3)?),
        text: row.get(4)?,
        created: ts_column(row, 5)?,
    })
}

fn row_to_follow(row: &Row<'_>) -> rusqlite::Result<Follow> {
    Ok(Follow {
        id: FollowId(row.get(0)?),
        user: User::new(UserId(row.get(1)?), row.get::<_, String>(2)?),
        following: User::new(UserId(row.get(3)?), row.get::<_, String>(4)?),
    })
}

fn row_to_group(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: GroupId(row.get(0)?),
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

fn fetch_post(conn: &Connection, id: PostId) -> Result<Option<Post>, StorageError> {
    conn.query_row(
        &format!("{POST_SELECT} WHERE p.id = ?1"),
        params![id.0],
        row_to_post,
    )
    .optional()
    .map_err(map_err)
}

fn fetch_comment(conn: &Connection, id: CommentId) -> Result<Option<Comment>, StorageError> {
    conn.query_row(
        &format!("{COMMENT_SELECT} WHERE c.id = ?1"),
        params![id.0],
        row_to_comment,
    )
    .optional()
    .map_err(map_err)
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for SqliteStorage {
    // --- Users ---------------------------------------------------------------

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StorageError> {
        let username = username.to_string();
        let password_hash = password_hash.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                params![username, password_hash],
            )
            .map_err(map_err)?;
            Ok(User::new(UserId(conn.last_insert_rowid()), username))
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT username FROM users WHERE id = ?1",
                params![id.0],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map(|name| name.map(|n| User::new(id, n)))
            .map_err(map_err)
        })
        .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.get_credentials(username).await?.map(|(user, _)| user))
    }

    async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, StorageError> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok((
                        User::new(UserId(row.get(0)?), row.get::<_, String>(1)?),
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    // --- Groups --------------------------------------------------------------

    async fn create_group(&self, group: &NewGroup) -> Result<Group, StorageError> {
        let group = group.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO groups (title, slug, description) VALUES (?1, ?2, ?3)",
                params![group.title, group.slug, group.description],
            )
            .map_err(map_err)?;
            Ok(Group {
                id: GroupId(conn.last_insert_rowid()),
                title: group.title,
                slug: group.slug,
                description: group.description,
            })
        })
        .await
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, title, slug, description FROM groups WHERE id = ?1",
                params![id.0],
                row_to_group,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, title, slug, description FROM groups ORDER BY id ASC")
                .map_err(map_err)?;
            let groups = stmt
                .query_map([], row_to_group)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;
            Ok(groups)
        })
        .await
    }

    // --- Posts ---------------------------------------------------------------

    async fn create_post(&self, post: &NewPost) -> Result<Post, StorageError> {
        let post = post.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO posts (text, pub_date, author_id, image, group_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    post.text,
                    fmt_ts(&Utc::now()),
                    post.author.0,
                    post.image,
                    post.group.map(|g| g.0),
                ],
            )
            .map_err(map_err)?;
            let id = PostId(conn.last_insert_rowid());
            fetch_post(conn, id)?.ok_or_else(|| {
                StorageError::Internal(format!("post {id} vanished after insert"))
            })
        })
        .await
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        self.with_conn(move |conn| fetch_post(conn, id)).await
    }

    async fn list_posts(
        &self,
        window: Option<PageWindow>,
    ) -> Result<(Vec<Post>, u64), StorageError> {
        self.with_conn(move |conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
                .map_err(map_err)?;

            // LIMIT -1 means "no limit" in SQLite.
            let (limit, offset) = match window {
                Some(w) => (
                    i64::try_from(w.limit).unwrap_or(i64::MAX),
                    i64::try_from(w.offset).unwrap_or(i64::MAX),
                ),
                None => (-1, 0),
            };

            let mut stmt = conn
                .prepare(&format!(
                    "{POST_SELECT} ORDER BY p.id ASC LIMIT ?1 OFFSET ?2"
                ))
                .map_err(map_err)?;
            let posts = stmt
                .query_map(params![limit, offset], row_to_post)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;

            Ok((posts, count.max(0) as u64))
        })
        .await
    }

    async fn update_post(
        &self,
        id: PostId,
        changes: &PostChanges,
    ) -> Result<Post, StorageError> {
        let changes = changes.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(map_err)?;
            let current = fetch_post(&tx, id)?.ok_or(StorageError::NotFound)?;

            let text = changes.text.unwrap_or(current.text);
            let image = changes.image.unwrap_or(current.image);
            let group = changes.group.unwrap_or(current.group);

            tx.execute(
                "UPDATE posts SET text = ?1, image = ?2, group_id = ?3 WHERE id = ?4",
                params![text, image, group.map(|g| g.0), id.0],
            )
            .map_err(map_err)?;

            let updated = fetch_post(&tx, id)?.ok_or(StorageError::NotFound)?;
            tx.commit().map_err(map_err)?;
            Ok(updated)
        })
        .await
    }

    async fn delete_post(&self, id: PostId) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            let n = conn
                .execute("DELETE FROM posts WHERE id = ?1", params![id.0])
                .map_err(map_err)?;
            if n == 0 {
                return Err(StorageError::NotFound);
            }
            Ok(())
        })
        .await
    }

    // --- Comments ------------------------------------------------------------

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment, StorageError> {
        let comment = comment.clone();
        self.with_conn(move |conn| {
            let post_exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
                    params![comment.post.0],
                    |row| row.get(0),
                )
                .map_err(map_err)?;
            if !post_exists {
                return Err(StorageError::NotFound);
            }

            conn.execute(
                "INSERT INTO comments (post_id, author_id, text, created)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    comment.post.0,
                    comment.author.0,
                    comment.text,
                    fmt_ts(&Utc::now()),
                ],
            )
            .map_err(map_err)?;
            let id = CommentId(conn.last_insert_rowid());
            fetch_comment(conn, id)?.ok_or_else(|| {
                StorageError::Internal(format!("comment {id} vanished after insert"))
            })
        })
        .await
    }

    async fn get_comment(
        &self,
        post: PostId,
        id: CommentId,
    ) -> Result<Option<Comment>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{COMMENT_SELECT} WHERE c.id = ?1 AND c.post_id = ?2"),
                params![id.0, post.0],
                row_to_comment,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn list_comments(&self, post: PostId) -> Result<Vec<Comment>, StorageError> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{COMMENT_SELECT} WHERE c.post_id = ?1 ORDER BY c.id ASC"
                ))
                .map_err(map_err)?;
            let comments = stmt
                .query_map(params![post.0], row_to_comment)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;
            Ok(comments)
        })
        .await
    }

    async fn update_comment(&self, id: CommentId, text: &str) -> Result<Comment, StorageError> {
        let text = text.to_string();
        self.with_conn(move |conn| {
            let n = conn
                .execute(
                    "UPDATE comments SET text = ?1 WHERE id = ?2",
                    params![text, id.0],
                )
                .map_err(map_err)?;
            if n == 0 {
                return Err(StorageError::NotFound);
            }
            fetch_comment(conn, id)?.ok_or(StorageError::NotFound)
        })
        .await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            let n = conn
                .execute("DELETE FROM comments WHERE id = ?1", params![id.0])
                .map_err(map_err)?;
            if n == 0 {
                return Err(StorageError::NotFound);
            }
            Ok(())
        })
        .await
    }

    // --- Follows -------------------------------------------------------------

    async fn create_follow(
        &self,
        user: UserId,
        following: UserId,
    ) -> Result<Follow, StorageError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO follows (user_id, following_id) VALUES (?1, ?2)",
                params![user.0, following.0],
            )
            .map_err(map_err)?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("{FOLLOW_SELECT} WHERE f.id = ?1"),
                params![id],
                row_to_follow,
            )
            .map_err(map_err)
        })
        .await
    }

    async fn follow_exists(&self, user: UserId, following: UserId) -> Result<bool, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ?1 AND following_id = ?2)",
                params![user.0, following.0],
                |row| row.get(0),
            )
            .map_err(map_err)
        })
        .await
    }

    async fn list_follows(&self, filter: &FollowFilter) -> Result<Vec<Follow>, StorageError> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{FOLLOW_SELECT} WHERE f.user_id = ?1 ORDER BY f.id ASC"
                ))
                .map_err(map_err)?;
            let follows = stmt
                .query_map(params![filter.user.0], row_to_follow)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;
            // Term matching happens here rather than in SQL so that case folding
            // is Unicode-aware, matching the in-memory backend.
            Ok(follows
                .into_iter()
                .filter(|f| matches_terms(&f.following.username, &filter.search_terms))
                .collect())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
