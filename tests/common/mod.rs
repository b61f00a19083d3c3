#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use blogicum::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    models::{Category, CategoryForm, Comment, Post, PostForm, ROLE_ADMIN, ROLE_AUTHOR, User},
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

/// Router over an in-memory repository, seeded through the `Repository` trait.
pub struct TestApp {
    pub repo: Arc<MemoryRepository>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(AppConfig::default(), MockStorageService::new())
    }

    pub fn with(config: AppConfig, storage: MockStorageService) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage) as StorageState,
            config,
        };
        Self { repo, state }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub async fn author(&self, username: &str) -> User {
        self.user(username, ROLE_AUTHOR).await
    }

    pub async fn admin(&self, username: &str) -> User {
        self.user(username, ROLE_ADMIN).await
    }

    async fn user(&self, username: &str, role: &str) -> User {
        self.repo
            .create_user(User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email: format!("{username}@example.com"),
                role: role.to_string(),
                ..User::default()
            })
            .await
            .unwrap()
    }

    pub async fn category(&self, slug: &str, is_published: bool) -> Category {
        self.repo
            .create_category(CategoryForm {
                title: format!("Category {slug}"),
                description: String::new(),
                slug: slug.to_string(),
                is_published,
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, form: PostForm) -> Post {
        self.repo.create_post(author.id, form).await.unwrap()
    }

    pub async fn comment(&self, post: &Post, author: &User, text: &str) -> Comment {
        self.repo
            .create_comment(post.id, author.id, text.to_string())
            .await
            .unwrap()
    }
}

/// A published post dated `days_ago` days in the past (negative means scheduled).
pub fn post_form(title: &str, days_ago: i64) -> PostForm {
    PostForm {
        title: title.to_string(),
        text: format!("Text of {title}"),
        pub_date: Utc::now() - Duration::days(days_ago),
        is_published: true,
        category_id: None,
        location_id: None,
        image: None,
    }
}

pub fn draft_form(title: &str) -> PostForm {
    PostForm {
        is_published: false,
        ..post_form(title, 1)
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Sends one request; `as_user` goes through the local `x-user-id` identity bypass.
pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    as_user: Option<&User>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = as_user {
        builder = builder.header("x-user-id", user.id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &TestApp, uri: &str, as_user: Option<&User>) -> TestResponse {
    send(app, Method::GET, uri, as_user, None).await
}

/// Titles of the posts in a `Page<Post>` body, in listing order.
pub fn titles(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}
