use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        AdminPostUpdate, Category, CategoryForm, Comment, Location, LocationForm, Post, PostForm,
        ProfileForm, User,
    },
    visibility::PostQuery,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Repository
///
/// Persistence contract for the four content entities and the profiles that own them.
/// Implementations must honour the relational rules: deleting a profile removes its
/// posts and comments, deleting a post removes its comments, and deleting a category
/// or location only detaches it from its posts.
///
/// Ownership is not checked here; handlers run the access policy first.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Profiles ---
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn create_user(&self, user: User) -> AppResult<User>;
    async fn update_user(&self, id: Uuid, form: ProfileForm) -> AppResult<Option<User>>;
    // Cascades to the user's posts and comments.
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    // --- Categories ---
    async fn list_categories(&self, search: Option<String>) -> AppResult<Vec<Category>>;
    async fn get_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>>;
    async fn create_category(&self, form: CategoryForm) -> AppResult<Category>;
    async fn update_category(&self, id: i64, form: CategoryForm) -> AppResult<Option<Category>>;
    // Posts keep existing with `category_id = NULL`.
    async fn delete_category(&self, id: i64) -> AppResult<bool>;

    // --- Locations ---
    async fn list_locations(&self, search: Option<String>) -> AppResult<Vec<Location>>;
    async fn create_location(&self, form: LocationForm) -> AppResult<Location>;
    async fn update_location(&self, id: i64, form: LocationForm) -> AppResult<Option<Location>>;
    async fn delete_location(&self, id: i64) -> AppResult<bool>;

    // --- Posts ---
    async fn count_posts(&self, query: &PostQuery) -> AppResult<usize>;
    // Canonical order: newest `pub_date` first, then title.
    async fn list_posts(&self, query: &PostQuery, limit: usize, offset: usize)
    -> AppResult<Vec<Post>>;
    // No visibility filter: callers decide with `policy::can_view`.
    async fn get_post(&self, id: i64) -> AppResult<Option<Post>>;
    async fn create_post(&self, author_id: Uuid, form: PostForm) -> AppResult<Post>;
    async fn update_post(&self, id: i64, form: PostForm) -> AppResult<Option<Post>>;
    async fn moderate_post(&self, id: i64, update: AdminPostUpdate) -> AppResult<Option<Post>>;
    // Cascades to the post's comments.
    async fn delete_post(&self, id: i64) -> AppResult<bool>;

    // --- Comments ---
    // Oldest first.
    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>>;
    async fn search_comments(&self, search: Option<String>) -> AppResult<Vec<Comment>>;
    async fn get_comment(&self, id: i64) -> AppResult<Option<Comment>>;
    async fn create_comment(&self, post_id: i64, author_id: Uuid, text: String)
    -> AppResult<Comment>;
    async fn update_comment(&self, id: i64, text: String) -> AppResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> AppResult<bool>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer stored in the application state.
pub type RepositoryState = Arc<dyn Repository>;
