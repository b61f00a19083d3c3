use axum::{Json, extract::State};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, ValidatedJson},
    models::{PresignedUrlRequest, PresignedUrlResponse},
    storage::post_image_key,
};

/// get_presigned_url
///
/// [Authenticated Route] Hands out a short-lived PUT URL for a post image. The client
/// uploads directly to object storage, then sends `resource_key` as the post's `image`.
#[utoipa::path(
    post,
    path = "/uploads/post-image",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 422, description = "Not an image type"),
        (status = 502, description = "Storage unavailable")
    )
)]
pub async fn get_presigned_url(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PresignedUrlRequest>,
) -> AppResult<Json<PresignedUrlResponse>> {
    let object_key = post_image_key(&payload.filename, Uuid::new_v4());

    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %user.id, "presigning {} failed: {}", object_key, e);
            AppError::Upstream(e)
        })?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}
