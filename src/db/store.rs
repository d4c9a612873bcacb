use async_trait::async_trait;

use crate::db::models::{Comment, NewComment, NewPost, NewUser, Post, User};
use crate::error::AppError;

/// User accounts and their single refresh-token record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, AppError>;

    /// Fails with `DatabaseError::Duplicate` on a taken email or nickname.
    async fn save_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Latest write wins; any previous token for `email` is replaced.
    async fn save_refresh_record(&self, email: &str, token: &str) -> Result<(), AppError>;

    async fn find_refresh_record(&self, email: &str) -> Result<Option<String>, AppError>;
}

/// Posts and their comment threads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError>;

    /// Newest first.
    async fn list_posts(&self) -> Result<Vec<Post>, AppError>;

    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError>;

    async fn update_post(&self, id: i64, title: &str, content: &str) -> Result<Option<Post>, AppError>;

    /// Removes the post and every comment under it. False if it did not exist.
    async fn delete_post(&self, id: i64) -> Result<bool, AppError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, AppError>;

    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError>;

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError>;

    /// Replaces the content with the deletion marker and flags the row.
    async fn mark_comment_deleted(&self, id: i64) -> Result<(), AppError>;
}
