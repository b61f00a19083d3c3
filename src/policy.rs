//! Per-request access decisions.
//!
//! Stateless predicates over opaque identities, plus the guard steps handlers run in
//! a fixed order: existence, visibility, ownership.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{Comment, Post, ROLE_ADMIN},
    visibility::is_visible,
};

/// Anything owned by exactly one author.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// The author always sees their own post; everyone else only sees visible posts.
pub fn can_view(viewer: Option<Uuid>, post: &Post, now: DateTime<Utc>) -> bool {
    viewer == Some(post.author_id) || is_visible(post, now)
}

/// Only the author may modify. Roles play no part here.
pub fn can_modify<T: Authored>(viewer: Uuid, entity: &T) -> bool {
    viewer == entity.author_id()
}

/// Guard: the entity must exist.
pub fn found<T>(entity: Option<T>) -> AppResult<T> {
    entity.ok_or(AppError::NotFound)
}

/// Guard: the post must exist and be viewable; both failures look the same.
pub fn viewable(viewer: Option<Uuid>, post: Option<Post>, now: DateTime<Utc>) -> AppResult<Post> {
    found(post).and_then(|post| {
        if can_view(viewer, &post, now) {
            Ok(post)
        } else {
            Err(AppError::NotFound)
        }
    })
}

/// Guard: the viewer must own the entity, otherwise they are sent to `fallback`.
pub fn owned_by<T: Authored>(viewer: Uuid, entity: T, fallback: String) -> AppResult<T> {
    if can_modify(viewer, &entity) {
        Ok(entity)
    } else {
        Err(AppError::Redirect(fallback))
    }
}

/// Guard for the administrative surface.
pub fn require_admin(user: &AuthUser) -> AppResult<()> {
    if user.role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
