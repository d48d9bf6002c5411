//! Access rules shared by the resource routes.

use crate::server::{Result, ServerError};
use axum::http::Method;
use yatube_common::model::{
    Id,
    user::{User, UserMarker},
};

/// GET, HEAD and OPTIONS never modify anything.
///
/// No route registers an OPTIONS handler, so an OPTIONS request is answered with 405 by
/// the router before this is ever consulted for it.
#[must_use]
pub fn is_safe_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

/// Object level rule for posts and comments: superusers may do anything, anyone may
/// read, and otherwise only the author may write.
#[must_use]
pub fn owner_or_reading(requester: Option<&User>, method: &Method, author: Id<UserMarker>) -> bool {
    requester.is_some_and(|user| user.is_superuser)
        || is_safe_method(method)
        || requester.is_some_and(|user| user.id == author)
}

pub fn ensure_owner_or_reading(
    requester: Option<&User>,
    method: &Method,
    author: Id<UserMarker>,
) -> Result<()> {
    if owner_or_reading(requester, method, author) {
        Ok(())
    } else {
        Err(ServerError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use crate::server::{
        ServerError,
        permissions::{ensure_owner_or_reading, is_safe_method, owner_or_reading},
    };
    use axum::http::Method;
    use yatube_common::model::{
        Id,
        user::{User, Username},
    };

    fn user(id: i64, is_superuser: bool) -> User {
        User {
            id: Id::new(id),
            username: Username::new(format!("user{id}")).unwrap(),
            is_superuser,
        }
    }

    #[test]
    fn safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(is_safe_method(&Method::OPTIONS));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::PUT));
        assert!(!is_safe_method(&Method::PATCH));
        assert!(!is_safe_method(&Method::DELETE));
    }

    #[test]
    fn author_may_write() {
        let author = user(1, false);
        for method in [Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(owner_or_reading(Some(&author), &method, author.id));
        }
    }

    #[test]
    fn others_may_only_read() {
        let other = user(2, false);
        let author_id = Id::new(1);

        assert!(owner_or_reading(Some(&other), &Method::GET, author_id));
        assert!(!owner_or_reading(Some(&other), &Method::PATCH, author_id));
        assert!(!owner_or_reading(Some(&other), &Method::DELETE, author_id));
        assert!(matches!(
            ensure_owner_or_reading(Some(&other), &Method::PUT, author_id),
            Err(ServerError::Forbidden)
        ));
    }

    #[test]
    fn anonymous_may_only_read() {
        let author_id = Id::new(1);

        assert!(owner_or_reading(None, &Method::GET, author_id));
        assert!(owner_or_reading(None, &Method::HEAD, author_id));
        assert!(!owner_or_reading(None, &Method::DELETE, author_id));
    }

    #[test]
    fn superuser_may_write_anything() {
        let admin = user(3, true);
        assert!(owner_or_reading(Some(&admin), &Method::DELETE, Id::new(1)));
        assert!(ensure_owner_or_reading(Some(&admin), &Method::PATCH, Id::new(1)).is_ok());
    }
}
