use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email);
    match state.auth_service.login(&req.email, &req.password).await {
        Ok(tokens) => Ok(HttpResponse::Ok().json(tokens)),
        Err(e) => {
            warn!("Login failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for email: {}", req.email);
    match state
        .auth_service
        .register(&req.email, &req.password, &req.nickname)
        .await
    {
        Ok(_) => Ok(HttpResponse::Created().json(MessageResponse::new("Registration complete"))),
        Err(e) => {
            warn!("Registration failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NicknameQuery {
    pub nickname: String,
}

pub async fn check_nickname(
    query: web::Query<NicknameQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if state.auth_service.is_nickname_available(&query.nickname).await? {
        Ok(HttpResponse::Ok().json(MessageResponse::new("Nickname is available")))
    } else {
        Err(AppError::Conflict("nickname is already taken".into()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReissueRequest {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn reissue(
    req: web::Json<ReissueRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received token reissue request");
    match state
        .auth_service
        .reissue(&req.access_token, &req.refresh_token)
        .await
    {
        Ok(token) => Ok(HttpResponse::Ok().json(token)),
        Err(e) => {
            warn!("Token reissue failed: {}", e);
            Err(e)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
