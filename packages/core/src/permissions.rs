//! Permission policy for every resource exposed by the API.
//!
//! Authorization happens in two steps, both answered by [`Policy`]:
//!
//! 1. **Request level** ([`Policy::check_request`]) runs before any lookup and
//!    only knows who is asking and what they want to do.
//! 2. **Object level** ([`Policy::check_object`]) runs once the target record
//!    has been loaded, for retrieve/update/delete.
//!
//! A denial is reported as a [`Denial`], which tells the HTTP layer whether
//! the caller should authenticate (401) or is simply not allowed (403).

use crate::types::{Comment, Post, User, UserId};

/// The operation a request performs on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    /// `true` for read-only operations (the HTTP "safe" methods).
    pub fn is_safe(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

/// Why an access check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    /// The caller is anonymous and the action requires a principal.
    #[error("authentication credentials were not provided")]
    NotAuthenticated,

    /// The caller is known but may not perform the action.
    #[error("you do not have permission to perform this action")]
    Forbidden,
}

/// Records that have an owning author.
pub trait Authored {
    fn author_id(&self) -> UserId;
}

impl Authored for Post {
    fn author_id(&self) -> UserId {
        self.author.id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> UserId {
        self.author.id
    }
}

/// Access rule attached to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Anyone may read; authenticated users may create; only the author may
    /// update or delete. Posts and comments.
    AuthorOrReadOnly,
    /// Every operation requires a principal; ownership is enforced by scoping
    /// queries to the principal instead of an object check. Follow edges.
    Authenticated,
    /// Anyone may read; nobody may write. Groups.
    ReadOnly,
}

impl Policy {
    /// Request-level check, before the target object (if any) is loaded.
    pub fn check_request(self, principal: Option<&User>, action: Action) -> Result<(), Denial> {
        match self {
            Policy::AuthorOrReadOnly => {
                if action.is_safe() || principal.is_some() {
                    Ok(())
                } else {
                    Err(Denial::NotAuthenticated)
                }
            }
            Policy::Authenticated => principal.map(|_| ()).ok_or(Denial::NotAuthenticated),
            Policy::ReadOnly => {
                if action.is_safe() {
                    Ok(())
                } else {
                    Err(deny(principal))
                }
            }
        }
    }

    /// Object-level check against a loaded record.
    pub fn check_object(
        self,
        principal: Option<&User>,
        action: Action,
        target: &dyn Authored,
    ) -> Result<(), Denial> {
        if action.is_safe() {
            return Ok(());
        }
        match self {
            Policy::AuthorOrReadOnly => match principal {
                Some(user) if user.id == target.author_id() => Ok(()),
                _ => Err(deny(principal)),
            },
            Policy::Authenticated => Ok(()),
            Policy::ReadOnly => Err(deny(principal)),
        }
    }
}

fn deny(principal: Option<&User>) -> Denial {
    match principal {
        Some(_) => Denial::Forbidden,
        None => Denial::NotAuthenticated,
    }
}

/// Combined check: may `principal` perform `action`, optionally on `target`?
pub fn can_access(
    policy: Policy,
    principal: Option<&User>,
    action: Action,
    target: Option<&dyn Authored>,
) -> bool {
    if policy.check_request(principal, action).is_err() {
        return false;
    }
    match target {
        Some(obj) => policy.check_object(principal, action, obj).is_ok(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::{PostId, UserId};

    fn user(id: i64, name: &str) -> User {
        User::new(UserId(id), name)
    }

    fn post_by(author: &User) -> Post {
        Post {
            id: PostId(1),
            text: "hi".into(),
            pub_date: Utc::now(),
            author: author.clone(),
            image: None,
            group: None,
        }
    }

    #[test]
    fn anonymous_may_read_posts_but_not_write() {
        let p = Policy::AuthorOrReadOnly;
        assert_eq!(p.check_request(None, Action::List), Ok(()));
        assert_eq!(p.check_request(None, Action::Retrieve), Ok(()));
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert_eq!(p.check_request(None, action), Err(Denial::NotAuthenticated));
        }
    }

    #[test]
    fn only_the_author_may_modify() {
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        let post = post_by(&alice);
        let p = Policy::AuthorOrReadOnly;

        assert_eq!(p.check_object(Some(&alice), Action::Update, &post), Ok(()));
        assert_eq!(p.check_object(Some(&alice), Action::Delete, &post), Ok(()));
        assert_eq!(
            p.check_object(Some(&bob), Action::Update, &post),
            Err(Denial::Forbidden)
        );
        assert_eq!(
            p.check_object(Some(&bob), Action::Delete, &post),
            Err(Denial::Forbidden)
        );
        // Everybody can read it.
        assert_eq!(p.check_object(Some(&bob), Action::Retrieve, &post), Ok(()));
        assert_eq!(p.check_object(None, Action::Retrieve, &post), Ok(()));
    }

    #[test]
    fn authenticated_policy_rejects_anonymous_reads() {
        let alice = user(1, "alice");
        let p = Policy::Authenticated;
        assert_eq!(p.check_request(None, Action::List), Err(Denial::NotAuthenticated));
        assert_eq!(p.check_request(Some(&alice), Action::List), Ok(()));
        assert_eq!(p.check_request(Some(&alice), Action::Create), Ok(()));
    }

    #[test]
    fn read_only_policy_never_allows_writes() {
        let alice = user(1, "alice");
        let p = Policy::ReadOnly;
        assert_eq!(p.check_request(None, Action::Retrieve), Ok(()));
        assert_eq!(p.check_request(None, Action::Create), Err(Denial::NotAuthenticated));
        assert_eq!(p.check_request(Some(&alice), Action::Create), Err(Denial::Forbidden));
    }

    #[test]
    fn can_access_combines_both_levels() {
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        let post = post_by(&alice);
        let p = Policy::AuthorOrReadOnly;

        assert!(can_access(p, None, Action::List, None));
        assert!(!can_access(p, None, Action::Create, None));
        assert!(can_access(p, Some(&bob), Action::Create, None));
        assert!(can_access(p, Some(&alice), Action::Update, Some(&post)));
        assert!(!can_access(p, Some(&bob), Action::Update, Some(&post)));
        assert!(!can_access(p, None, Action::Delete, Some(&post)));
    }
}
