use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::db::models::{
    Comment, NewComment, NewPost, NewUser, Post, User, DELETED_COMMENT_MARKER,
};
use crate::db::store::{BoardStore, CredentialStore};
use crate::error::{AppError, DatabaseError};

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    user_id: i64,
    parent_id: Option<i64>,
    content: String,
    created_at: chrono::DateTime<Utc>,
    deleted: bool,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: HashMap<String, String>,
    posts: Vec<Post>,
    comments: Vec<CommentRow>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn join_writer(&self, row: &CommentRow) -> Result<Comment, AppError> {
        let writer = self
            .users
            .iter()
            .find(|u| u.id == row.user_id)
            .ok_or(DatabaseError::NotFound)?;

        Ok(Comment {
            id: row.id,
            post_id: row.post_id,
            parent_id: row.parent_id,
            content: row.content.clone(),
            writer_nickname: writer.nickname.clone(),
            writer_email: writer.email.clone(),
            created_at: row.created_at,
            deleted: row.deleted,
        })
    }
}

/// Process-local store with the same semantics as the Postgres schema:
/// unique email and nickname, one refresh record per email, cascading
/// comment removal.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().any(|u| u.nickname == nickname))
    }

    async fn save_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.email == user.email || u.nickname == user.nickname)
        {
            return Err(DatabaseError::Duplicate.into());
        }

        let user = User {
            id: Tables::next_id(&mut tables.next_user_id),
            email: user.email,
            password_hash: user.password_hash,
            nickname: user.nickname,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn save_refresh_record(&self, email: &str, token: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables
            .refresh_tokens
            .insert(email.to_string(), token.to_string());
        Ok(())
    }

    async fn find_refresh_record(&self, email: &str) -> Result<Option<String>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.refresh_tokens.get(email).cloned())
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError> {
        let mut tables = self.tables.write().await;
        let post = Post {
            id: Tables::next_id(&mut tables.next_post_id),
            title: post.title,
            content: post.content,
            email: post.email,
            nickname: post.nickname,
            created_at: Utc::now(),
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let tables = self.tables.read().await;
        let mut posts = tables.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update_post(&self, id: i64, title: &str, content: &str) -> Result<Option<Post>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.title = title.to_string();
            post.content = content.to_string();
            post.clone()
        }))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }
        tables.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(DatabaseError::NotFound.into());
        }

        let row = CommentRow {
            id: Tables::next_id(&mut tables.next_comment_id),
            post_id: comment.post_id,
            user_id: comment.user_id,
            parent_id: comment.parent_id,
            content: comment.content,
            created_at: Utc::now(),
            deleted: false,
        };
        let joined = tables.join_writer(&row)?;
        tables.comments.push(row);
        Ok(joined)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&CommentRow> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rows.into_iter().map(|row| tables.join_writer(row)).collect()
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let tables = self.tables.read().await;
        tables
            .comments
            .iter()
            .find(|c| c.id == id)
            .map(|row| tables.join_writer(row))
            .transpose()
    }

    async fn mark_comment_deleted(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DatabaseError::NotFound)?;
        row.content = DELETED_COMMENT_MARKER.to_string();
        row.deleted = true;
        Ok(())
    }
}
