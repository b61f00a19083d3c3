use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        AdminPostUpdate, Category, CategoryForm, Comment, Location, LocationForm, Post, PostForm,
        ProfileForm, User,
    },
    visibility::{PostQuery, thread_order},
};

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    title: String,
    text: String,
    pub_date: DateTime<Utc>,
    is_published: bool,
    image: Option<String>,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    category_id: Option<i64>,
    location_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Store {
    users: BTreeMap<Uuid, User>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    last_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.categories
            .values()
            .any(|c| c.slug == slug && Some(c.id) != except)
    }

    fn check_references(&self, category_id: Option<i64>, location_id: Option<i64>) -> AppResult<()> {
        let category_ok = category_id.is_none_or(|id| self.categories.contains_key(&id));
        let location_ok = location_id.is_none_or(|id| self.locations.contains_key(&id));
        if category_ok && location_ok {
            Ok(())
        } else {
            Err(AppError::BadRequest("referenced record does not exist".to_string()))
        }
    }

    fn decorate_post(&self, row: &PostRow) -> Post {
        let author_username = self
            .users
            .get(&row.author_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let category = row.category_id.and_then(|id| self.categories.get(&id));
        let location = row.location_id.and_then(|id| self.locations.get(&id));
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == row.id)
            .count() as i64;

        Post {
            id: row.id,
            title: row.title.clone(),
            text: row.text.clone(),
            pub_date: row.pub_date,
            is_published: row.is_published,
            image: row.image.clone(),
            created_at: row.created_at,
            author_id: row.author_id,
            author_username,
            category_id: category.map(|c| c.id),
            category_title: category.map(|c| c.title.clone()),
            category_slug: category.map(|c| c.slug.clone()),
            category_is_published: category.map(|c| c.is_published),
            location_id: location.map(|l| l.id),
            location_name: location.map(|l| l.name.clone()),
            comment_count,
        }
    }

    fn decorate_comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_username: self
                .users
                .get(&row.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            text: row.text.clone(),
            created_at: row.created_at,
        }
    }

    fn posts_matching(&self, query: &PostQuery) -> Vec<Post> {
        query.apply(self.posts.values().map(|row| self.decorate_post(row)))
    }

    fn sorted_comments<'a>(&self, rows: impl Iterator<Item = &'a CommentRow>) -> Vec<Comment> {
        let mut comments: Vec<Comment> = rows.map(|row| self.decorate_comment(row)).collect();
        comments.sort_by(thread_order);
        comments
    }
}

/// MemoryRepository
///
/// `Repository` kept entirely in process memory, with the same relational rules as the
/// Postgres schema. Backs the handler tests and database-less local runs.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: User) -> AppResult<User> {
        let mut store = self.store.write().await;
        if store.users.contains_key(&user.id) || store.username_taken(&user.username, None) {
            return Err(AppError::Conflict(format!("user {} already exists", user.username)));
        }
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, form: ProfileForm) -> AppResult<Option<User>> {
        let mut store = self.store.write().await;
        if store.username_taken(&form.username, Some(id)) {
            return Err(AppError::Conflict(format!("username {} is taken", form.username)));
        }
        Ok(store.users.get_mut(&id).map(|user| {
            user.first_name = form.first_name;
            user.last_name = form.last_name;
            user.username = form.username;
            user.email = form.email;
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.store.write().await;
        if store.users.remove(&id).is_none() {
            return Ok(false);
        }
        store.posts.retain(|_, post| post.author_id != id);
        let Store {
            posts, comments, ..
        } = &mut *store;
        comments.retain(|_, c| c.author_id != id && posts.contains_key(&c.post_id));
        Ok(true)
    }

    // --- CATEGORIES ---

    async fn list_categories(&self, search: Option<String>) -> AppResult<Vec<Category>> {
        let store = self.store.read().await;
        let needle = search.map(|s| s.to_lowercase());
        let mut categories: Vec<Category> = store
            .categories
            .values()
            .filter(|c| {
                needle
                    .as_ref()
                    .is_none_or(|n| c.title.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        categories.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(categories)
    }

    async fn get_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        let store = self.store.read().await;
        Ok(store.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn create_category(&self, form: CategoryForm) -> AppResult<Category> {
        let mut store = self.store.write().await;
        if store.slug_taken(&form.slug, None) {
            return Err(AppError::Conflict(format!("slug {} is taken", form.slug)));
        }
        let category = Category {
            id: store.next_id(),
            title: form.title,
            description: form.description,
            slug: form.slug,
            is_published: form.is_published,
            created_at: Utc::now(),
        };
        store.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, form: CategoryForm) -> AppResult<Option<Category>> {
        let mut store = self.store.write().await;
        if store.slug_taken(&form.slug, Some(id)) {
            return Err(AppError::Conflict(format!("slug {} is taken", form.slug)));
        }
        Ok(store.categories.get_mut(&id).map(|category| {
            category.title = form.title;
            category.description = form.description;
            category.slug = form.slug;
            category.is_published = form.is_published;
            category.clone()
        }))
    }

    async fn delete_category(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.write().await;
        if store.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for post in store.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(true)
    }

    // --- LOCATIONS ---

    async fn list_locations(&self, search: Option<String>) -> AppResult<Vec<Location>> {
        let store = self.store.read().await;
        let needle = search.map(|s| s.to_lowercase());
        let mut locations: Vec<Location> = store
            .locations
            .values()
            .filter(|l| {
                needle
                    .as_ref()
                    .is_none_or(|n| l.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        locations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(locations)
    }

    async fn create_location(&self, form: LocationForm) -> AppResult<Location> {
        let mut store = self.store.write().await;
        let location = Location {
            id: store.next_id(),
            name: form.name,
            is_published: form.is_published,
            created_at: Utc::now(),
        };
        store.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn update_location(&self, id: i64, form: LocationForm) -> AppResult<Option<Location>> {
        let mut store = self.store.write().await;
        Ok(store.locations.get_mut(&id).map(|location| {
            location.name = form.name;
            location.is_published = form.is_published;
            location.clone()
        }))
    }

    async fn delete_location(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.write().await;
        if store.locations.remove(&id).is_none() {
            return Ok(false);
        }
        for post in store.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(true)
    }

    // --- POSTS ---

    async fn count_posts(&self, query: &PostQuery) -> AppResult<usize> {
        Ok(self.store.read().await.posts_matching(query).len())
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Post>> {
        let store = self.store.read().await;
        Ok(store
            .posts_matching(query)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn get_post(&self, id: i64) -> AppResult<Option<Post>> {
        let store = self.store.read().await;
        Ok(store.posts.get(&id).map(|row| store.decorate_post(row)))
    }

    async fn create_post(&self, author_id: Uuid, form: PostForm) -> AppResult<Post> {
        let mut store = self.store.write().await;
        if !store.users.contains_key(&author_id) {
            return Err(AppError::BadRequest("author does not exist".to_string()));
        }
        store.check_references(form.category_id, form.location_id)?;
        let row = PostRow {
            id: store.next_id(),
            title: form.title,
            text: form.text,
            pub_date: form.pub_date,
            is_published: form.is_published,
            image: form.image,
            created_at: Utc::now(),
            author_id,
            category_id: form.category_id,
            location_id: form.location_id,
        };
        let post = store.decorate_post(&row);
        store.posts.insert(row.id, row);
        Ok(post)
    }

    async fn update_post(&self, id: i64, form: PostForm) -> AppResult<Option<Post>> {
        let mut store = self.store.write().await;
        store.check_references(form.category_id, form.location_id)?;
        let Some(row) = store.posts.get_mut(&id) else {
            return Ok(None);
        };
        row.title = form.title;
        row.text = form.text;
        row.pub_date = form.pub_date;
        row.is_published = form.is_published;
        row.image = form.image;
        row.category_id = form.category_id;
        row.location_id = form.location_id;
        let row = row.clone();
        Ok(Some(store.decorate_post(&row)))
    }

    async fn moderate_post(&self, id: i64, update: AdminPostUpdate) -> AppResult<Option<Post>> {
        let mut store = self.store.write().await;
        store.check_references(update.category_id, update.location_id)?;
        let Some(row) = store.posts.get_mut(&id) else {
            return Ok(None);
        };
        row.is_published = update.is_published;
        row.category_id = update.category_id;
        row.location_id = update.location_id;
        let row = row.clone();
        Ok(Some(store.decorate_post(&row)))
    }

    async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.write().await;
        if store.posts.remove(&id).is_none() {
            return Ok(false);
        }
        store.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    // --- COMMENTS ---

    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        let store = self.store.read().await;
        Ok(store.sorted_comments(store.comments.values().filter(|c| c.post_id == post_id)))
    }

    async fn search_comments(&self, search: Option<String>) -> AppResult<Vec<Comment>> {
        let store = self.store.read().await;
        let needle = search.map(|s| s.to_lowercase());
        Ok(store.sorted_comments(store.comments.values().filter(|c| {
            needle
                .as_ref()
                .is_none_or(|n| c.text.to_lowercase().contains(n))
        })))
    }

    async fn get_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        let store = self.store.read().await;
        Ok(store.comments.get(&id).map(|row| store.decorate_comment(row)))
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: String,
    ) -> AppResult<Comment> {
        let mut store = self.store.write().await;
        if !store.posts.contains_key(&post_id) || !store.users.contains_key(&author_id) {
            return Err(AppError::BadRequest("referenced record does not exist".to_string()));
        }
        let row = CommentRow {
            id: store.next_id(),
            post_id,
            author_id,
            text,
            created_at: Utc::now(),
        };
        let comment = store.decorate_comment(&row);
        store.comments.insert(row.id, row);
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, text: String) -> AppResult<Option<Comment>> {
        let mut store = self.store.write().await;
        let Some(row) = store.comments.get_mut(&id) else {
            return Ok(None);
        };
        row.text = text;
        let row = row.clone();
        Ok(Some(store.decorate_comment(&row)))
    }

    async fn delete_comment(&self, id: i64) -> AppResult<bool> {
        Ok(self.store.write().await.comments.remove(&id).is_some())
    }
}
