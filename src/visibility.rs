//! Which posts the public gets to see, and in what order.
//!
//! `PostQuery` is the single description of a listing: the repositories either
//! evaluate it directly (`matches`/`apply`) or translate it to SQL. The visibility
//! gate is one more intersected predicate, so narrowing by category or author can
//! never widen what is shown.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Comment, Post};

/// A post is visible iff it is published, its category (when attached) is published,
/// and its publication date has already passed.
pub fn is_visible(post: &Post, now: DateTime<Utc>) -> bool {
    post.is_published && post.category_is_published.unwrap_or(true) && post.pub_date < now
}

/// Newest publication first, ties broken by title in byte order, then by id.
pub fn canonical_order(a: &Post, b: &Post) -> Ordering {
    b.pub_date
        .cmp(&a.pub_date)
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

/// Thread order: oldest comment first.
pub fn thread_order(a: &Comment, b: &Comment) -> Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

/// PostQuery
///
/// Composable listing filter. Every set field narrows the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostQuery {
    /// When set, only posts visible at this instant pass.
    pub visible_at: Option<DateTime<Utc>>,
    pub author_id: Option<Uuid>,
    pub category_slug: Option<String>,
    pub category_id: Option<i64>,
    /// Case-insensitive title substring.
    pub title_search: Option<String>,
}

impl PostQuery {
    /// Every post, regardless of publication state.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only posts the public may see at `now`.
    pub fn visible(now: DateTime<Utc>) -> Self {
        Self {
            visible_at: Some(now),
            ..Self::default()
        }
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, slug: impl Into<String>) -> Self {
        self.category_slug = Some(slug.into());
        self
    }

    pub fn in_category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn title_contains(mut self, needle: impl Into<String>) -> Self {
        self.title_search = Some(needle.into());
        self
    }

    pub fn matches(&self, post: &Post) -> bool {
        if let Some(now) = self.visible_at {
            if !is_visible(post, now) {
                return false;
            }
        }
        if let Some(author_id) = self.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        if let Some(slug) = &self.category_slug {
            if post.category_slug.as_deref() != Some(slug.as_str()) {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if post.category_id != Some(category_id) {
                return false;
            }
        }
        if let Some(needle) = &self.title_search {
            if !post.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// Filters and orders an in-memory collection.
    pub fn apply(&self, posts: impl IntoIterator<Item = Post>) -> Vec<Post> {
        let mut selected: Vec<Post> = posts.into_iter().filter(|p| self.matches(p)).collect();
        selected.sort_by(canonical_order);
        selected
    }
}
