//! Fixed-size page slicing for listings.
//!
//! Requested page numbers never fail: anything unparsable means page 1 and anything
//! out of range clamps to the nearest existing page.

use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Default number of posts per listing page.
pub const POSTS_PER_PAGE: usize = 10;

/// PageQuery
///
/// The `?page=` query parameter. Kept as a raw string so that garbage input falls
/// back to the first page instead of being rejected by the extractor.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// Resolves a raw `page` value to a valid 1-based page number. Integers too large
    /// for `i64` still clamp to the matching bound.
    pub fn resolve(&self, requested: Option<&str>) -> usize {
        let last = self.num_pages() as i64;
        let Some(raw) = requested else {
            return 1;
        };
        let number = match raw.trim().parse::<i64>() {
            Ok(number) => number,
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => last,
            Err(_) => return 1,
        };
        number.clamp(1, last) as usize
    }

    /// Row offset of a resolved page.
    pub fn offset(&self, number: usize) -> usize {
        (number.saturating_sub(1)) * self.per_page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Wraps the rows already fetched for page `number`.
    pub fn page<T>(&self, number: usize, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            items,
            number,
            num_pages,
            total: self.total,
            per_page: self.per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }

    /// Slices an in-memory, already ordered collection.
    pub fn paginate<T>(all: Vec<T>, per_page: usize, requested: Option<&str>) -> Page<T> {
        let paginator = Paginator::new(all.len(), per_page);
        let number = paginator.resolve(requested);
        let items = all
            .into_iter()
            .skip(paginator.offset(number))
            .take(paginator.per_page)
            .collect();
        paginator.page(number, items)
    }
}

/// Page
///
/// One slice of a listing plus the metadata a pager needs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
}
