use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Redirect,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::paginate_posts;
use crate::{
    AppState,
    auth::{AuthUser, Viewer},
    error::{AppError, AppResult, ValidatedJson, validated},
    models::{Category, EditContext, Post, PostDetail, PostForm},
    pagination::{Page, PageQuery},
    policy,
    routes::{post_path, profile_path},
    visibility::PostQuery,
};

/// CategoryPage
///
/// A published category and one page of its visible posts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryPage {
    pub category: Category,
    pub page: Page<Post>,
}

/// list_posts
///
/// [Public Route] The index: visible posts only, newest first.
#[utoipa::path(
    get,
    path = "/posts",
    params(PageQuery),
    responses((status = 200, description = "One page of visible posts", body = Page<Post>))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Page<Post>>> {
    let query = PostQuery::visible(Utc::now());
    Ok(Json(paginate_posts(&state, &query, &page).await?))
}

/// category_posts
///
/// [Public Route] Visible posts of one category. Unknown and unpublished categories
/// are both reported as not found.
#[utoipa::path(
    get,
    path = "/category/{slug}",
    params(("slug" = String, Path, description = "Category slug"), PageQuery),
    responses(
        (status = 200, description = "Category with one page of its posts", body = CategoryPage),
        (status = 404, description = "No such published category")
    )
)]
pub async fn category_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<CategoryPage>> {
    let category = state
        .repo
        .get_category_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or(AppError::NotFound)?;

    let query = PostQuery::visible(Utc::now()).in_category(slug);
    let page = paginate_posts(&state, &query, &page).await?;
    Ok(Json(CategoryPage { category, page }))
}

/// post_detail
///
/// [Public Route] A post and its comment thread. Authors always see their own post;
/// anyone else gets 404 unless the post is visible.
#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post with comments", body = PostDetail),
        (status = 404, description = "Missing or not visible")
    )
)]
pub async fn post_detail(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<PostDetail>> {
    let post = policy::viewable(viewer.id(), state.repo.get_post(post_id).await?, Utc::now())?;
    let comments = state.repo.list_comments(post.id).await?;
    Ok(Json(PostDetail { post, comments }))
}

/// create_post
///
/// [Authenticated Route] The author is always the requesting identity.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = PostForm,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<PostForm>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let post = state.repo.create_post(user.id, form).await?;
    tracing::info!(post_id = post.id, author = %user.id, "created post {}", post);
    Ok((StatusCode::CREATED, Json(post)))
}

/// edit_post_form
///
/// [Authenticated Route] Pre-fill data for the edit form. Non-owners are redirected
/// to the post page.
#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Edit context", body = EditContext<Post>),
        (status = 303, description = "Not the author"),
        (status = 404, description = "Missing or not visible")
    )
)]
pub async fn edit_post_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<EditContext<Post>>> {
    let post = owned_post(&state, &user, post_id).await?;
    Ok(Json(EditContext::new(post)))
}

/// update_post
///
/// [Authenticated Route] Replaces the post's editable fields. Owner-only.
#[utoipa::path(
    put,
    path = "/posts/{post_id}",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body = PostForm,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 303, description = "Not the author"),
        (status = 404, description = "Missing or not visible"),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    payload: Result<Json<PostForm>, JsonRejection>,
) -> AppResult<Json<Post>> {
    owned_post(&state, &user, post_id).await?;
    let form = validated(payload)?;
    let post = policy::found(state.repo.update_post(post_id, form).await?)?;
    tracing::info!(post_id, "updated post {}", post);
    Ok(Json(post))
}

/// delete_post
///
/// [Authenticated Route] Deletes a post and, with it, its comments. Owner-only; the
/// caller is then pointed at their profile.
#[utoipa::path(
    delete,
    path = "/posts/{post_id}",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Deleted (to profile) or not the author (to post)"),
        (status = 404, description = "Missing or not visible")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Redirect> {
    let post = owned_post(&state, &user, post_id).await?;
    if !state.repo.delete_post(post.id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(post_id, "deleted post {}", post);
    Ok(Redirect::to(&profile_path(&post.author_username)))
}

/// Existence, visibility, then ownership.
async fn owned_post(state: &AppState, user: &AuthUser, post_id: i64) -> AppResult<Post> {
    let post = policy::viewable(Some(user.id), state.repo.get_post(post_id).await?, Utc::now())?;
    policy::owned_by(user.id, post, post_path(post_id))
}
