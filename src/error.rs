use std::collections::HashMap;

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::{Validate, ValidationError, ValidationErrors};

/// AppError
///
/// Every failure a handler can surface. Visibility failures and genuinely missing
/// rows both become `NotFound` so that unpublished content cannot be probed for.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    /// Soft permission failure: the caller is sent to an already-valid view.
    #[error("redirect to {0}")]
    Redirect(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Redirect(_) => StatusCode::SEE_OTHER,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Flattens validator output into `{field: [message, ...]}`.
pub fn field_messages(errors: &ValidationErrors) -> HashMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value for {field}"))
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => return AppError::Conflict(db_err.message().to_string()),
                // foreign_key_violation
                Some("23503") => {
                    return AppError::BadRequest("referenced record does not exist".to_string());
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

/// Bodies that parse as JSON but do not fit the form are field-level failures (422);
/// anything else about the body is a 400.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "body",
                    ValidationError::new("parse").with_message(e.body_text().into()),
                );
                AppError::Validation(errors)
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// Unwraps a deferred `Json` extraction and applies the form rules. Handlers that guard
/// an entity first take `Result<Json<T>, JsonRejection>` and call this afterwards.
pub fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    let Json(value) = payload?;
    value.validate()?;
    Ok(value)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Redirect(location) => Redirect::to(&location).into_response(),
            AppError::Validation(errors) => (
                status,
                Json(json!({ "error": "validation failed", "fields": field_messages(&errors) })),
            )
                .into_response(),
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                (status, Json(json!({ "error": "internal error" }))).into_response()
            }
            AppError::Upstream(ref msg) => {
                tracing::warn!("upstream failure: {}", msg);
                (status, Json(json!({ "error": "upstream service failure" }))).into_response()
            }
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

/// ValidatedJson
///
/// JSON body extractor that runs `validator` rules after deserialization. Malformed JSON
/// is a 400; missing or mistyped fields and rule violations are a 422 with field-level
/// messages.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        validated(Json::<T>::from_request(req, state).await).map(ValidatedJson)
    }
}
