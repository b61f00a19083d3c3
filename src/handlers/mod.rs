//! HTTP handlers, grouped by the resource they serve.
//!
//! Author-facing handlers run the same guard order: the `AuthUser` extractor
//! (authenticated?), then existence and visibility (`policy::viewable`), then
//! ownership (`policy::owned_by`), and only then form validation.

use crate::{
    AppState,
    error::AppResult,
    models::Post,
    pagination::{Page, PageQuery, Paginator},
    visibility::PostQuery,
};

pub mod admin;
pub mod comments;
pub mod posts;
pub mod profiles;
pub mod uploads;

/// Counts, resolves the requested page, then fetches only that page's rows.
pub(crate) async fn paginate_posts(
    state: &AppState,
    query: &PostQuery,
    page: &PageQuery,
) -> AppResult<Page<Post>> {
    let total = state.repo.count_posts(query).await?;
    let paginator = Paginator::new(total, state.config.posts_per_page);
    let number = paginator.resolve(page.page.as_deref());
    let items = state
        .repo
        .list_posts(query, paginator.per_page(), paginator.offset(number))
        .await?;
    Ok(paginator.page(number, items))
}
