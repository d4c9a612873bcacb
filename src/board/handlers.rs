use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::handlers::MessageResponse;
use crate::auth::Authenticated;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
}

pub async fn create_post(
    caller: Authenticated,
    req: web::Json<PostRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let post = state
        .board_service
        .create_post(caller.email(), &req.title, &req.content)
        .await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn list_posts(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.board_service.list_posts().await?))
}

pub async fn get_post(
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.board_service.get_post(path.into_inner()).await?))
}

pub async fn update_post(
    caller: Authenticated,
    path: web::Path<i64>,
    req: web::Json<PostRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let post = state
        .board_service
        .update_post(path.into_inner(), caller.email(), &req.title, &req.content)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    caller: Authenticated,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .board_service
        .delete_post(path.into_inner(), caller.email())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
    pub parent_id: Option<i64>,
}

pub async fn list_comments(
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.board_service.list_comments(path.into_inner()).await?))
}

pub async fn add_comment(
    caller: Authenticated,
    path: web::Path<i64>,
    req: web::Json<CommentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let comment = state
        .board_service
        .add_comment(path.into_inner(), caller.email(), &req.content, req.parent_id)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn delete_comment(
    caller: Authenticated,
    path: web::Path<(i64, i64)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (post_id, comment_id) = path.into_inner();
    state
        .board_service
        .delete_comment(post_id, comment_id, caller.email())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Comment deleted")))
}
