//! Router modules, split by access level. The auth `route_layer` is attached per
//! module in `create_router`: everything except `public` sits behind it.

/// Routes open to anonymous visitors. Handlers still apply the visibility rules.
pub mod public;

/// Routes behind the `AuthUser` extractor layer.
pub mod authenticated;

/// Routes behind the auth layer whose handlers additionally require the admin role.
pub mod admin;

/// Canonical URL of a single post; also where non-owners are sent back to.
pub fn post_path(post_id: i64) -> String {
    format!("/posts/{post_id}")
}

/// Canonical URL of a profile page.
pub fn profile_path(username: &str) -> String {
    format!("/profile/{username}")
}
