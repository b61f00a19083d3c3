use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{delete, get, patch, put},
};

/// Admin Router Module
///
/// Moderation of every entity, nested under `/admin`. The auth layer applied in
/// `create_router` authenticates; each handler then calls `require_admin`, so a
/// signed-in author gets 403 rather than 401.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Categories ---
        .route(
            "/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            "/categories/{id}",
            put(admin::update_category).delete(admin::delete_category),
        )
        // --- Locations ---
        .route(
            "/locations",
            get(admin::list_locations).post(admin::create_location),
        )
        .route(
            "/locations/{id}",
            put(admin::update_location).delete(admin::delete_location),
        )
        // --- Posts ---
        // GET /admin/posts?category=&author=&search=&page=
        // Includes drafts, scheduled posts and posts of hidden categories.
        .route("/posts", get(admin::list_posts))
        .route(
            "/posts/{id}",
            patch(admin::moderate_post).delete(admin::delete_post),
        )
        // --- Comments ---
        .route("/comments", get(admin::list_comments))
        .route(
            "/comments/{id}",
            patch(admin::edit_comment).delete(admin::delete_comment),
        )
        // --- Profiles ---
        // Cascades to everything the profile authored.
        .route("/users/{id}", delete(admin::delete_user))
}
