use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any signed-in author. The auth layer above guarantees an `AuthUser`;
/// ownership of posts and comments is checked inside the handlers, and a non-owner
/// is redirected to the post page rather than refused.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PUT /me
        .route(
            "/me",
            get(handlers::profiles::get_me).put(handlers::profiles::update_me),
        )
        // POST /uploads/post-image
        // Presigned PUT URL for uploading a post image straight to object storage.
        .route(
            "/uploads/post-image",
            post(handlers::uploads::get_presigned_url),
        )
        // --- Posts ---
        .route("/posts", post(handlers::posts::create_post))
        .route("/posts/{post_id}/edit", get(handlers::posts::edit_post_form))
        // PUT/DELETE share the path with the public GET; the routers are merged.
        .route(
            "/posts/{post_id}",
            put(handlers::posts::update_post).delete(handlers::posts::delete_post),
        )
        // --- Comments ---
        .route(
            "/posts/{post_id}/comments",
            post(handlers::comments::add_comment),
        )
        .route(
            "/posts/{post_id}/comments/{comment_id}/edit",
            get(handlers::comments::edit_comment_form),
        )
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            put(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
}
