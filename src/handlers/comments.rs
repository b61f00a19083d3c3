use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Redirect,
};
use chrono::Utc;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, validated},
    models::{Comment, CommentForm, EditContext, Post},
    policy,
    routes::post_path,
};

/// add_comment
///
/// [Authenticated Route] Comments on a post the caller can currently see.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/comments",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body = CommentForm,
    responses(
        (status = 201, description = "Created", body = Comment),
        (status = 404, description = "Post missing or not visible"),
        (status = 422, description = "Empty comment")
    )
)]
pub async fn add_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    payload: Result<Json<CommentForm>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let post = visible_post(&state, &user, post_id).await?;
    let form = validated(payload)?;
    let comment = state.repo.create_comment(post.id, user.id, form.text).await?;
    tracing::info!(post_id, comment_id = comment.id, "comment added: {}", comment);
    Ok((StatusCode::CREATED, Json(comment)))
}

/// edit_comment_form
///
/// [Authenticated Route] Pre-fill data for editing a comment.
#[utoipa::path(
    get,
    path = "/posts/{post_id}/comments/{comment_id}/edit",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Edit context", body = EditContext<Comment>),
        (status = 303, description = "Not the comment's author"),
        (status = 404, description = "Missing or not visible")
    )
)]
pub async fn edit_comment_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<Json<EditContext<Comment>>> {
    let comment = owned_comment(&state, &user, post_id, comment_id).await?;
    Ok(Json(EditContext::new(comment)))
}

/// update_comment
///
/// [Authenticated Route] Replaces a comment's text. Owner-only.
#[utoipa::path(
    put,
    path = "/posts/{post_id}/comments/{comment_id}",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    request_body = CommentForm,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 303, description = "Not the comment's author"),
        (status = 404, description = "Missing or not visible"),
        (status = 422, description = "Empty comment")
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    payload: Result<Json<CommentForm>, JsonRejection>,
) -> AppResult<Json<Comment>> {
    owned_comment(&state, &user, post_id, comment_id).await?;
    let form = validated(payload)?;
    let comment = policy::found(state.repo.update_comment(comment_id, form.text).await?)?;
    tracing::info!(post_id, comment_id, "comment edited");
    Ok(Json(comment))
}

/// delete_comment
///
/// [Authenticated Route] Owner-only. Either way the caller ends up back on the post.
#[utoipa::path(
    delete,
    path = "/posts/{post_id}/comments/{comment_id}",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 303, description = "Deleted, or not the comment's author"),
        (status = 404, description = "Missing or not visible")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<Redirect> {
    owned_comment(&state, &user, post_id, comment_id).await?;
    if !state.repo.delete_comment(comment_id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(post_id, comment_id, "comment deleted");
    Ok(Redirect::to(&post_path(post_id)))
}

async fn visible_post(state: &AppState, user: &AuthUser, post_id: i64) -> AppResult<Post> {
    policy::viewable(Some(user.id), state.repo.get_post(post_id).await?, Utc::now())
}

/// The parent post must be visible and the comment must belong to it.
async fn owned_comment(
    state: &AppState,
    user: &AuthUser,
    post_id: i64,
    comment_id: i64,
) -> AppResult<Comment> {
    visible_post(state, user, post_id).await?;
    let comment = state
        .repo
        .get_comment(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or(AppError::NotFound)?;
    policy::owned_by(user.id, comment, post_path(post_id))
}
