//! Administrative surface. Every handler requires an authenticated identity with the
//! admin role; ownership rules do not apply here.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::paginate_posts;
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, ValidatedJson},
    models::{
        AdminPostUpdate, Category, CategoryForm, Comment, CommentForm, Location, LocationForm, Post,
    },
    pagination::{Page, PageQuery},
    policy::{self, require_admin},
    visibility::PostQuery,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive substring filter.
    pub search: Option<String>,
}

/// AdminPostFilter
///
/// Filters of the admin post listing. Unlike the public listings, drafts and
/// scheduled posts are included.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminPostFilter {
    pub category: Option<i64>,
    pub author: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<String>,
}

fn not_found_unless(deleted: bool) -> AppResult<StatusCode> {
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

// --- Categories ---

#[utoipa::path(
    get,
    path = "/admin/categories",
    params(SearchQuery),
    responses(
        (status = 200, description = "All categories, published or not", body = [Category]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_categories(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Category>>> {
    require_admin(&user)?;
    Ok(Json(state.repo.list_categories(query.search).await?))
}

#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryForm,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 409, description = "Slug already used"),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<CategoryForm>,
) -> AppResult<(StatusCode, Json<Category>)> {
    require_admin(&user)?;
    let category = state.repo.create_category(form).await?;
    tracing::info!(category_id = category.id, "category created: {}", category);
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryForm,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Slug already used")
    )
)]
pub async fn update_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(form): ValidatedJson<CategoryForm>,
) -> AppResult<Json<Category>> {
    require_admin(&user)?;
    Ok(Json(policy::found(state.repo.update_category(id, form).await?)?))
}

/// delete_category
///
/// Posts of the category survive, detached from it.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;
    let deleted = state.repo.delete_category(id).await?;
    if deleted {
        tracing::info!(category_id = id, "category deleted");
    }
    not_found_unless(deleted)
}

// --- Locations ---

#[utoipa::path(
    get,
    path = "/admin/locations",
    params(SearchQuery),
    responses((status = 200, description = "All locations", body = [Location]))
)]
pub async fn list_locations(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Location>>> {
    require_admin(&user)?;
    Ok(Json(state.repo.list_locations(query.search).await?))
}

#[utoipa::path(
    post,
    path = "/admin/locations",
    request_body = LocationForm,
    responses((status = 201, description = "Created", body = Location))
)]
pub async fn create_location(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<LocationForm>,
) -> AppResult<(StatusCode, Json<Location>)> {
    require_admin(&user)?;
    let location = state.repo.create_location(form).await?;
    tracing::info!(location_id = location.id, "location created: {}", location);
    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    put,
    path = "/admin/locations/{id}",
    params(("id" = i64, Path, description = "Location ID")),
    request_body = LocationForm,
    responses(
        (status = 200, description = "Updated", body = Location),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_location(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(form): ValidatedJson<LocationForm>,
) -> AppResult<Json<Location>> {
    require_admin(&user)?;
    Ok(Json(policy::found(state.repo.update_location(id, form).await?)?))
}

#[utoipa::path(
    delete,
    path = "/admin/locations/{id}",
    params(("id" = i64, Path, description = "Location ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_location(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;
    not_found_unless(state.repo.delete_location(id).await?)
}

// --- Posts ---

/// list_posts
///
/// Every post regardless of visibility, in canonical order, with optional filters.
#[utoipa::path(
    get,
    path = "/admin/posts",
    params(AdminPostFilter),
    responses((status = 200, description = "One page of posts", body = Page<Post>))
)]
pub async fn list_posts(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<AdminPostFilter>,
) -> AppResult<Json<Page<Post>>> {
    require_admin(&user)?;

    let mut query = PostQuery::all();
    if let Some(category_id) = filter.category {
        query = query.in_category_id(category_id);
    }
    if let Some(author_id) = filter.author {
        query = query.by_author(author_id);
    }
    if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
        query = query.title_contains(search.trim());
    }

    let page = PageQuery { page: filter.page };
    Ok(Json(paginate_posts(&state, &query, &page).await?))
}

/// moderate_post
///
/// Inline edit from the listing: publication flag, category, location.
#[utoipa::path(
    patch,
    path = "/admin/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = AdminPostUpdate,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 400, description = "Unknown category or location"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn moderate_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<AdminPostUpdate>, JsonRejection>,
) -> AppResult<Json<Post>> {
    require_admin(&user)?;
    let Json(update) = payload?;
    let post = policy::found(state.repo.moderate_post(id, update).await?)?;
    tracing::info!(post_id = id, is_published = post.is_published, "post moderated");
    Ok(Json(post))
}

#[utoipa::path(
    delete,
    path = "/admin/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted with its comments"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;
    not_found_unless(state.repo.delete_post(id).await?)
}

// --- Comments ---

#[utoipa::path(
    get,
    path = "/admin/comments",
    params(SearchQuery),
    responses((status = 200, description = "All comments, oldest first", body = [Comment]))
)]
pub async fn list_comments(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Comment>>> {
    require_admin(&user)?;
    Ok(Json(state.repo.search_comments(query.search).await?))
}

#[utoipa::path(
    patch,
    path = "/admin/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentForm,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(form): ValidatedJson<CommentForm>,
) -> AppResult<Json<Comment>> {
    require_admin(&user)?;
    Ok(Json(policy::found(state.repo.update_comment(id, form.text).await?)?))
}

#[utoipa::path(
    delete,
    path = "/admin/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;
    not_found_unless(state.repo.delete_comment(id).await?)
}

// --- Profiles ---

/// delete_user
///
/// Removes a profile together with all of its posts and comments.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Profile ID")),
    responses(
        (status = 204, description = "Deleted with all authored content"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;
    let deleted = state.repo.delete_user(id).await?;
    if deleted {
        tracing::warn!(user_id = %id, admin = %user.id, "profile deleted with its content");
    }
    not_found_unless(deleted)
}
