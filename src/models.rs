use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const MAX_LABEL_LENGTH: usize = 16;

pub const ROLE_AUTHOR: &str = "author";
pub const ROLE_ADMIN: &str = "admin";

/// Shortens a display string to `MAX_LABEL_LENGTH` characters, ending in an ellipsis.
pub fn short_label(input: &str) -> String {
    if input.chars().count() > MAX_LABEL_LENGTH {
        let head: String = input.chars().take(MAX_LABEL_LENGTH - 3).collect();
        format!("{head}...")
    } else {
        input.to_string()
    }
}

// --- Core Schemas (Mapped to Database) ---

/// User
///
/// A profile row mirroring an identity issued by the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    // 'author' or 'admin'.
    pub role: String,
}

/// PublicProfile
///
/// The part of a profile shown on someone's profile page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_label(&self.title))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_label(&self.name))
    }
}

/// Post
///
/// A post row decorated with its related data (author, category, location) and the
/// number of comments, as every listing needs them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    // May lie in the future: a deferred publication.
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    // Object storage key of the attached image.
    pub image: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,

    pub author_id: Uuid,
    pub author_username: String,

    // NULL when no category is attached (or it was deleted).
    pub category_id: Option<i64>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub category_is_published: Option<bool>,

    pub location_id: Option<i64>,
    pub location_name: Option<String>,

    pub comment_count: i64,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_label(&self.title))
    }
}

/// Comment
///
/// A comment row joined with the author's username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_label(&self.text))
    }
}

// --- Request Payloads (Input Schemas) ---

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message(
            "Slug may contain only latin letters, digits, hyphens and underscores".into(),
        ))
    }
}

fn validate_image_mime(file_type: &str) -> Result<(), ValidationError> {
    if file_type.starts_with("image/") {
        Ok(())
    } else {
        Err(ValidationError::new("file_type").with_message("Only images can be uploaded".into()))
    }
}

fn default_true() -> bool {
    true
}

/// PostForm
///
/// Create and edit payload for a post. The author is never part of the form: it is
/// always the requesting identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct PostForm {
    #[validate(length(min = 1, max = 256, message = "Title must be 1 to 256 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: String,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "Comment must not be empty"))]
    pub text: String,
}

/// ProfileForm
///
/// Editable profile fields (`PUT /me`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct ProfileForm {
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters"))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 256, message = "Title must be 1 to 256 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct LocationForm {
    #[validate(length(min = 1, max = 256, message = "Name must be 1 to 256 characters"))]
    pub name: String,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

/// AdminPostUpdate
///
/// Inline moderation of a post from the admin listing: publication flag and the two
/// optional references. Absent references are cleared.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminPostUpdate {
    pub is_published: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub location_id: Option<i64>,
}

/// RegisterUserRequest
///
/// Public registration payload. The password is only forwarded to the identity
/// provider and never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters"))]
    pub username: String,
}

/// PresignedUrlRequest
///
/// Input for requesting a short-lived upload URL for a post image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default, Validate)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "sunset.jpg")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "image/jpeg")]
    #[validate(custom(function = "validate_image_mime"))]
    pub file_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key to store in `PostForm::image` once the upload completes.
    pub resource_key: String,
}

// --- Response Contexts (Output) ---

/// PostDetail
///
/// Single post page: the post and its comment thread, oldest comment first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// EditContext
///
/// What an edit form is pre-filled with: the current object and the `is_edit` flag.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EditContext<T> {
    pub object: T,
    pub is_edit: bool,
}

impl<T> EditContext<T> {
    pub fn new(object: T) -> Self {
        Self {
            object,
            is_edit: true,
        }
    }
}
