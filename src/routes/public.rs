use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without authentication. Listings only ever contain visible
/// posts; the single-post page additionally shows an author their own hidden posts,
/// which is why these handlers take the optional `Viewer` identity.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Signs up with the identity provider and mirrors the profile locally.
        .route("/register", post(handlers::profiles::register_user))
        // GET /posts?page=
        // The index: visible posts, newest first, paginated.
        .route("/posts", get(handlers::posts::list_posts))
        // GET /posts/{post_id}
        // Post page with its comment thread.
        .route("/posts/{post_id}", get(handlers::posts::post_detail))
        // GET /category/{slug}?page=
        // Visible posts of a published category.
        .route("/category/{slug}", get(handlers::posts::category_posts))
        // GET /profile/{username}?page=
        // Profile page; the owner also sees drafts and scheduled posts.
        .route("/profile/{username}", get(handlers::profiles::profile))
}
