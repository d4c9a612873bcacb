use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::db::models::{Comment, NewComment, NewPost, NewUser, Post, User, DELETED_COMMENT_MARKER};
use crate::db::store::{BoardStore, CredentialStore};
use crate::error::{AppError, DatabaseError};

const USER_COLUMNS: &str = "id, email, password_hash, nickname, role, created_at";
const POST_COLUMNS: &str = "id, title, content, email, nickname, created_at";
const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.parent_id, c.content,
           u.nickname AS writer_nickname, u.email AS writer_email,
           c.created_at, c.deleted
    FROM comments c
    JOIN users u ON u.id = c.user_id
"#;

/// Postgres-backed store for accounts, sessions, posts and comments.
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CredentialStore for DbOperations {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE nickname = $1)")
                .bind(nickname)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn save_user(&self, user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, nickname, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .bind(&user.role)
        .bind(Utc::now())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn save_refresh_record(&self, email: &str, token: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (email, token, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET token = EXCLUDED.token, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(email)
        .bind(token)
        .bind(Utc::now())
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn find_refresh_record(&self, email: &str) -> Result<Option<String>, AppError> {
        let token: Option<String> =
            sqlx::query_scalar("SELECT token FROM refresh_tokens WHERE email = $1")
                .bind(email)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(token)
    }
}

#[async_trait]
impl BoardStore for DbOperations {
    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (title, content, email, nickname, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.email)
        .bind(&post.nickname)
        .bind(Utc::now())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(post)
    }

    async fn update_post(&self, id: i64, title: &str, content: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET title = $2, content = $3 WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        ))
        .bind(id)
        .bind(title)
        .bind(content)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> Result<bool, AppError> {
        // Comments follow through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, user_id, parent_id, content, created_at, deleted)
                VALUES ($1, $2, $3, $4, $5, FALSE)
                RETURNING *
            )
            SELECT c.id, c.post_id, c.parent_id, c.content,
                   u.nickname AS writer_nickname, u.email AS writer_email,
                   c.created_at, c.deleted
            FROM inserted c
            JOIN users u ON u.id = c.user_id
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(comment.parent_id)
        .bind(&comment.content)
        .bind(Utc::now())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{} WHERE c.post_id = $1 ORDER BY c.created_at ASC, c.id ASC",
            COMMENT_SELECT
        ))
        .bind(post_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(comments)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(&format!("{} WHERE c.id = $1", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(comment)
    }

    async fn mark_comment_deleted(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE comments SET content = $2, deleted = TRUE WHERE id = $1")
            .bind(id)
            .bind(DELETED_COMMENT_MARKER)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound.into());
        }
        Ok(())
    }
}
