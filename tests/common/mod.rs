#![allow(dead_code)]

use actix_web::test::TestRequest;
use board_server::{AppState, Settings};
use serde_json::{json, Value};

pub const PASSWORD: &str = "password123";

/// Builds the full middleware stack around the route table, as `main` does.
macro_rules! board_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(board_server::auth::AccessPolicy::default())
                .wrap($state.request_gate())
                .app_data(actix_web::web::Data::new($state.clone()))
                .configure(board_server::configure_routes),
        )
        .await
    };
}

pub fn test_state() -> AppState {
    let config = Settings::new_for_test().expect("Failed to load test config");
    AppState::in_memory(config).expect("Failed to build in-memory state")
}

pub fn register_request(email: &str, nickname: &str) -> TestRequest {
    TestRequest::post().uri("/api/users/register").set_json(json!({
        "email": email,
        "password": PASSWORD,
        "nickname": nickname
    }))
}

pub fn login_request(email: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
}

pub fn reissue_request(access_token: &Value, refresh_token: &Value) -> TestRequest {
    TestRequest::post().uri("/api/users/reissue").set_json(json!({
        "accessToken": access_token,
        "refreshToken": refresh_token
    }))
}

pub fn bearer(token: &Value) -> (&'static str, String) {
    let token = token.as_str().expect("token should be a string");
    ("Authorization", format!("Bearer {}", token))
}
