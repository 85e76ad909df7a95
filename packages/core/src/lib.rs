//! Domain layer of the Yatube blog API.
//!
//! This crate holds the pieces that do not depend on HTTP or on a particular
//! storage backend: the entity types, the permission policy that decides who
//! may read or write them, and the field validators shared by the server and
//! the admin CLI.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Entities: [`User`], [`Group`], [`Post`], [`Comment`], [`Follow`] and their id newtypes |
//! | [`permissions`] | [`Policy`], [`Action`], [`Denial`] and the [`can_access`] contract |
//! | [`validation`] | Field validators and the [`FieldErrors`] accumulator |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use yatube::{can_access, Action, Policy, User, UserId};
//!
//! let alice = User::new(UserId(1), "alice");
//! assert!(can_access(Policy::AuthorOrReadOnly, None, Action::List, None));
//! assert!(!can_access(Policy::AuthorOrReadOnly, None, Action::Create, None));
//! assert!(can_access(Policy::AuthorOrReadOnly, Some(&alice), Action::Create, None));
//! ```

pub mod permissions;
pub mod types;
pub mod validation;

pub use permissions::{can_access, Action, Authored, Denial, Policy};
pub use types::{
    Comment, CommentId, Follow, FollowId, Group, GroupId, Post, PostId, User, UserId,
};
pub use validation::{FieldErrors, ValidationError, NON_FIELD_ERRORS};
