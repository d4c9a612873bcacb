use std::sync::Arc;

use tracing::info;

use crate::db::models::{Comment, NewComment, NewPost, Post};
use crate::db::store::{BoardStore, CredentialStore};
use crate::error::AppError;

pub const MAX_COMMENT_LENGTH: usize = 500;

pub struct BoardService {
    posts: Arc<dyn BoardStore>,
    users: Arc<dyn CredentialStore>,
}

impl BoardService {
    pub fn new(posts: Arc<dyn BoardStore>, users: Arc<dyn CredentialStore>) -> Self {
        Self { posts, users }
    }

    pub async fn create_post(&self, author_email: &str, title: &str, content: &str) -> Result<Post, AppError> {
        if title.trim().is_empty() {
            return Err(AppError::ValidationError("title is required".into()));
        }
        let author = self
            .users
            .find_by_email(author_email)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;

        let post = self
            .posts
            .insert_post(NewPost {
                title: title.to_string(),
                content: content.to_string(),
                email: author.email,
                nickname: author.nickname,
            })
            .await?;

        info!(post_id = post.id, email = %post.email, "post created");
        Ok(post)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        self.posts.list_posts().await
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, AppError> {
        self.posts
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))
    }

    pub async fn update_post(
        &self,
        id: i64,
        editor_email: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, AppError> {
        let post = self.get_post(id).await?;
        if post.email != editor_email {
            return Err(AppError::Forbidden("only the author may edit this post".into()));
        }
        if title.trim().is_empty() {
            return Err(AppError::ValidationError("title is required".into()));
        }

        self.posts
            .update_post(id, title, content)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))
    }

    pub async fn delete_post(&self, id: i64, requester_email: &str) -> Result<(), AppError> {
        let post = self.get_post(id).await?;
        if post.email != requester_email {
            return Err(AppError::Forbidden("only the author may delete this post".into()));
        }
        if !self.posts.delete_post(id).await? {
            return Err(AppError::NotFound(format!("post {}", id)));
        }

        info!(post_id = id, "post deleted");
        Ok(())
    }

    pub async fn add_comment(
        &self,
        post_id: i64,
        writer_email: &str,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::ValidationError("comment content is required".into()));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(AppError::ValidationError(format!(
                "comment content exceeds {} characters",
                MAX_COMMENT_LENGTH
            )));
        }

        self.get_post(post_id).await?;
        let writer = self
            .users
            .find_by_email(writer_email)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;

        if let Some(parent_id) = parent_id {
            let parent = self
                .posts
                .find_comment(parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("parent comment {}", parent_id)))?;
            if parent.post_id != post_id {
                return Err(AppError::ValidationError(
                    "parent comment belongs to another post".into(),
                ));
            }
        }

        self.posts
            .insert_comment(NewComment {
                post_id,
                user_id: writer.id,
                parent_id,
                content: content.to_string(),
            })
            .await
    }

    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        self.posts.list_comments(post_id).await
    }

    /// Soft delete; replies keep pointing at the flagged comment.
    pub async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        requester_email: &str,
    ) -> Result<(), AppError> {
        let comment = self
            .posts
            .find_comment(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;

        if comment.writer_email != requester_email {
            return Err(AppError::Forbidden("only the writer may delete this comment".into()));
        }

        self.posts.mark_comment_deleted(comment_id).await?;
        info!(comment_id, "comment deleted");
        Ok(())
    }
}
