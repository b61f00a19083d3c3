use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain rules: visibility, pagination and the access policy.
pub mod pagination;
pub mod policy;
pub mod visibility;

// Services and plumbing.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Public, authenticated and admin routers.
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every annotated handler, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::posts::list_posts, handlers::posts::category_posts,
        handlers::posts::post_detail, handlers::posts::create_post,
        handlers::posts::edit_post_form, handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::comments::add_comment, handlers::comments::edit_comment_form,
        handlers::comments::update_comment, handlers::comments::delete_comment,
        handlers::profiles::profile, handlers::profiles::get_me,
        handlers::profiles::update_me, handlers::profiles::register_user,
        handlers::uploads::get_presigned_url,
        handlers::admin::list_categories, handlers::admin::create_category,
        handlers::admin::update_category, handlers::admin::delete_category,
        handlers::admin::list_locations, handlers::admin::create_location,
        handlers::admin::update_location, handlers::admin::delete_location,
        handlers::admin::list_posts, handlers::admin::moderate_post,
        handlers::admin::delete_post,
        handlers::admin::list_comments, handlers::admin::edit_comment,
        handlers::admin::delete_comment, handlers::admin::delete_user
    ),
    components(
        schemas(
            models::User, models::PublicProfile, models::Category, models::Location,
            models::Post, models::Comment, models::PostForm, models::CommentForm,
            models::ProfileForm, models::CategoryForm, models::LocationForm,
            models::AdminPostUpdate, models::RegisterUserRequest, models::PostDetail,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            handlers::posts::CategoryPage, handlers::profiles::ProfilePage,
        )
    ),
    tags(
        (name = "blogicum", description = "Blogicum blogging API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request: persistence, object storage and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Runs the `AuthUser` extractor ahead of the handler; a failed resolution answers
/// 401 without reaching the route.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the public, authenticated and admin routers, the docs, and the
/// request-id/trace/CORS stack around them.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Authenticated here; the admin role is checked inside each handler.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request carrying the `x-request-id`, so every log line of one request
/// can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
