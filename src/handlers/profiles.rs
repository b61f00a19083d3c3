use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::paginate_posts;
use crate::{
    AppState,
    auth::{AuthUser, Viewer},
    error::{AppError, AppResult, ValidatedJson},
    models::{Post, ProfileForm, PublicProfile, ROLE_AUTHOR, RegisterUserRequest, User},
    pagination::{Page, PageQuery},
    policy,
    visibility::PostQuery,
};

/// ProfilePage
///
/// A profile and one page of its posts. Owners also see their drafts and scheduled posts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfilePage {
    pub profile: PublicProfile,
    pub page: Page<Post>,
}

#[derive(Debug, Deserialize)]
struct SignupResponse {
    id: Uuid,
}

/// profile
///
/// [Public Route] Someone's profile page. Strangers see the visible subset; the owner
/// sees every post they wrote.
#[utoipa::path(
    get,
    path = "/profile/{username}",
    params(("username" = String, Path, description = "Username"), PageQuery),
    responses(
        (status = 200, description = "Profile with one page of posts", body = ProfilePage),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn profile(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ProfilePage>> {
    let user = policy::found(state.repo.get_user_by_username(&username).await?)?;

    let query = if viewer.id() == Some(user.id) {
        PostQuery::all()
    } else {
        PostQuery::visible(Utc::now())
    }
    .by_author(user.id);

    let page = paginate_posts(&state, &query, &page).await?;
    Ok(Json(ProfilePage {
        profile: user.into(),
        page,
    }))
}

/// get_me
///
/// [Authenticated Route] The caller's own profile, including email and role.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Own profile", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> AppResult<Json<User>> {
    Ok(Json(policy::found(state.repo.get_user(user.id).await?)?))
}

/// update_me
///
/// [Authenticated Route] Edits the caller's own profile. The role cannot be changed here.
#[utoipa::path(
    put,
    path = "/me",
    request_body = ProfileForm,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 409, description = "Username taken"),
        (status = 422, description = "Invalid form")
    )
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<ProfileForm>,
) -> AppResult<Json<User>> {
    let updated = policy::found(state.repo.update_user(user.id, form).await?)?;
    tracing::info!(user_id = %updated.id, username = %updated.username, "profile updated");
    Ok(Json(updated))
}

/// register_user
///
/// [Public Route] Signs the user up with the identity provider, then mirrors the
/// returned identity into a local profile with the same id. New profiles are always
/// authors. A locally taken username is refused before the provider is contacted.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 400, description = "Rejected by the identity provider"),
        (status = 409, description = "Username taken"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let (Some(auth_url), Some(api_key)) = (&state.config.auth_url, &state.config.auth_api_key)
    else {
        return Err(AppError::Upstream(
            "identity provider is not configured".to_string(),
        ));
    };

    if state.repo.get_user_by_username(&payload.username).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "username {} is taken",
            payload.username
        )));
    }

    let response = reqwest::Client::new()
        .post(format!("{}/auth/v1/signup", auth_url.trim_end_matches('/')))
        .header("apikey", api_key)
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "identity provider rejected signup");
        return Err(AppError::BadRequest(
            "registration was rejected by the identity provider".to_string(),
        ));
    }

    let identity = response
        .json::<SignupResponse>()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let user = state
        .repo
        .create_user(User {
            id: identity.id,
            username: payload.username,
            email: payload.email,
            role: ROLE_AUTHOR.to_string(),
            ..User::default()
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "registered");
    Ok((StatusCode::CREATED, Json(user)))
}
