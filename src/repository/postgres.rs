use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        AdminPostUpdate, Category, CategoryForm, Comment, Location, LocationForm, Post, PostForm,
        ProfileForm, User,
    },
    visibility::PostQuery,
};

/// Posts joined with their related rows and comment count, ready for any listing.
const POST_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.text, p.pub_date, p.is_published, p.image, p.created_at,
        p.author_id, u.username AS author_username,
        p.category_id, c.title AS category_title, c.slug AS category_slug,
        c.is_published AS category_is_published,
        p.location_id, l.name AS location_name,
        (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN profiles u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT cm.id, cm.post_id, cm.author_id, u.username AS author_username, cm.text, cm.created_at
    FROM comments cm
    JOIN profiles u ON u.id = cm.author_id
"#;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, role";

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Relational rules (cascade / set-null) live in
/// the schema's foreign keys, see `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn require_post(&self, id: i64) -> AppResult<Post> {
        self.get_post(id)
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }
}

/// `%needle%` for `ILIKE ... ESCAPE '\'`, with the needle's own wildcards taken literally.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Translates a `PostQuery` into WHERE clauses. The category join (`c`) must be present.
fn push_post_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    builder.push(" WHERE TRUE");
    if let Some(now) = query.visible_at {
        builder.push(
            " AND p.is_published = TRUE AND (p.category_id IS NULL OR c.is_published = TRUE) AND p.pub_date < ",
        );
        builder.push_bind(now);
    }
    if let Some(author_id) = query.author_id {
        builder.push(" AND p.author_id = ");
        builder.push_bind(author_id);
    }
    if let Some(slug) = &query.category_slug {
        builder.push(" AND c.slug = ");
        builder.push_bind(slug.clone());
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND p.category_id = ");
        builder.push_bind(category_id);
    }
    if let Some(needle) = &query.title_search {
        builder.push(" AND p.title ILIKE ");
        builder.push_bind(like_pattern(needle));
        builder.push(r" ESCAPE '\'");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM profiles WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM profiles WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Mirrors an identity created at the external identity provider.
    async fn create_user(&self, user: User) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO profiles ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(user.username)
            .bind(user.email)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("create_user error: {:?}", e))?)
    }

    async fn update_user(&self, id: Uuid, form: ProfileForm) -> AppResult<Option<User>> {
        let sql = format!(
            "UPDATE profiles SET first_name = $2, last_name = $3, username = $4, email = $5 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(form.first_name)
            .bind(form.last_name)
            .bind(form.username)
            .bind(form.email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete_user error: {:?}", e))?;
        Ok(res.rows_affected() > 0)
    }

    // --- CATEGORIES ---

    async fn list_categories(&self, search: Option<String>) -> AppResult<Vec<Category>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, title, description, slug, is_published, created_at FROM categories WHERE TRUE",
        );
        if let Some(s) = search {
            builder.push(" AND title ILIKE ");
            builder.push_bind(like_pattern(&s));
            builder.push(r" ESCAPE '\'");
        }
        builder.push(" ORDER BY created_at DESC, id DESC");
        Ok(builder
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_categories error: {:?}", e))?)
    }

    async fn get_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, title, description, slug, is_published, created_at FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_category(&self, form: CategoryForm) -> AppResult<Category> {
        Ok(sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (title, description, slug, is_published)
               VALUES ($1, $2, $3, $4)
               RETURNING id, title, description, slug, is_published, created_at"#,
        )
        .bind(form.title)
        .bind(form.description)
        .bind(form.slug)
        .bind(form.is_published)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_category(&self, id: i64, form: CategoryForm) -> AppResult<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            r#"UPDATE categories
               SET title = $2, description = $3, slug = $4, is_published = $5
               WHERE id = $1
               RETURNING id, title, description, slug, is_published, created_at"#,
        )
        .bind(id)
        .bind(form.title)
        .bind(form.description)
        .bind(form.slug)
        .bind(form.is_published)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_category(&self, id: i64) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete_category error: {:?}", e))?;
        Ok(res.rows_affected() > 0)
    }

    // --- LOCATIONS ---

    async fn list_locations(&self, search: Option<String>) -> AppResult<Vec<Location>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, name, is_published, created_at FROM locations WHERE TRUE",
        );
        if let Some(s) = search {
            builder.push(" AND name ILIKE ");
            builder.push_bind(like_pattern(&s));
            builder.push(r" ESCAPE '\'");
        }
        builder.push(" ORDER BY created_at DESC, id DESC");
        Ok(builder
            .build_query_as::<Location>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_locations error: {:?}", e))?)
    }

    async fn create_location(&self, form: LocationForm) -> AppResult<Location> {
        Ok(sqlx::query_as::<_, Location>(
            "INSERT INTO locations (name, is_published) VALUES ($1, $2) RETURNING id, name, is_published, created_at",
        )
        .bind(form.name)
        .bind(form.is_published)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_location(&self, id: i64, form: LocationForm) -> AppResult<Option<Location>> {
        Ok(sqlx::query_as::<_, Location>(
            "UPDATE locations SET name = $2, is_published = $3 WHERE id = $1 RETURNING id, name, is_published, created_at",
        )
        .bind(id)
        .bind(form.name)
        .bind(form.is_published)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_location(&self, id: i64) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete_location error: {:?}", e))?;
        Ok(res.rows_affected() > 0)
    }

    // --- POSTS ---

    async fn count_posts(&self, query: &PostQuery) -> AppResult<usize> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id",
        );
        push_post_filters(&mut builder, query);
        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("count_posts error: {:?}", e))?;
        Ok(count.max(0) as usize)
    }

    /// Builds the listing with `QueryBuilder` so every filter value is a bound parameter.
    async fn list_posts(
        &self,
        query: &PostQuery,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Post>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(POST_SELECT);
        push_post_filters(&mut builder, query);
        builder.push(" ORDER BY p.pub_date DESC, p.title COLLATE \"C\" ASC, p.id ASC LIMIT ");
        builder.push_bind(limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset as i64);

        Ok(builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_posts error: {:?}", e))?)
    }

    async fn get_post(&self, id: i64) -> AppResult<Option<Post>> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("get_post error: {:?}", e))?)
    }

    async fn create_post(&self, author_id: Uuid, form: PostForm) -> AppResult<Post> {
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO posts (title, text, pub_date, is_published, image, author_id, category_id, location_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id"#,
        )
        .bind(form.title)
        .bind(form.text)
        .bind(form.pub_date)
        .bind(form.is_published)
        .bind(form.image)
        .bind(author_id)
        .bind(form.category_id)
        .bind(form.location_id)
        .fetch_one(&self.pool)
        .await?;
        self.require_post(id).await
    }

    async fn update_post(&self, id: i64, form: PostForm) -> AppResult<Option<Post>> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"UPDATE posts
               SET title = $2, text = $3, pub_date = $4, is_published = $5,
                   image = $6, category_id = $7, location_id = $8
               WHERE id = $1
               RETURNING id"#,
        )
        .bind(id)
        .bind(form.title)
        .bind(form.text)
        .bind(form.pub_date)
        .bind(form.is_published)
        .bind(form.image)
        .bind(form.category_id)
        .bind(form.location_id)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(id) => self.require_post(id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn moderate_post(&self, id: i64, update: AdminPostUpdate) -> AppResult<Option<Post>> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"UPDATE posts SET is_published = $2, category_id = $3, location_id = $4
               WHERE id = $1 RETURNING id"#,
        )
        .bind(id)
        .bind(update.is_published)
        .bind(update.category_id)
        .bind(update.location_id)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(id) => self.require_post(id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete_post error: {:?}", e))?;
        Ok(res.rows_affected() > 0)
    }

    // --- COMMENTS ---

    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE cm.post_id = $1 ORDER BY cm.created_at ASC, cm.id ASC");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_comments error: {:?}", e))?)
    }

    async fn search_comments(&self, search: Option<String>) -> AppResult<Vec<Comment>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(COMMENT_SELECT);
        builder.push(" WHERE TRUE");
        if let Some(s) = search {
            builder.push(" AND cm.text ILIKE ");
            builder.push_bind(like_pattern(&s));
            builder.push(r" ESCAPE '\'");
        }
        builder.push(" ORDER BY cm.created_at ASC, cm.id ASC");
        Ok(builder
            .build_query_as::<Comment>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("search_comments error: {:?}", e))?)
    }

    async fn get_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE cm.id = $1");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Inserts and joins the author's username in a single statement.
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: String,
    ) -> AppResult<Comment> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3)
                RETURNING id, post_id, author_id, text, created_at
            )
            SELECT i.id, i.post_id, i.author_id, u.username AS author_username, i.text, i.created_at
            FROM inserted i JOIN profiles u ON u.id = i.author_id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("create_comment error: {:?}", e))?)
    }

    async fn update_comment(&self, id: i64, text: String) -> AppResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments SET text = $2 WHERE id = $1
                RETURNING id, post_id, author_id, text, created_at
            )
            SELECT d.id, d.post_id, d.author_id, u.username AS author_username, d.text, d.created_at
            FROM updated d JOIN profiles u ON u.id = d.author_id
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_comment(&self, id: i64) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete_comment error: {:?}", e))?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("50%"), r"%50\%%");
        assert_eq!(like_pattern("snake_case"), r"%snake\_case%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn listing_filters_escape_the_title_search() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM posts p");
        push_post_filters(&mut builder, &PostQuery::all().title_contains("50%"));
        assert!(builder.sql().ends_with(r"p.title ILIKE $1 ESCAPE '\'"));
    }
}
