#[macro_use]
mod common;

use actix_web::test;
use serde_json::{json, Value};

use common::{bearer, login_request, register_request, reissue_request, test_state};

#[actix_web::test]
async fn test_register_and_login() {
    let state = test_state();
    let app = board_app!(state);

    let resp = register_request("test@example.com", "tester").send_request(&app).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::call_and_read_body_json(&app, login_request("test@example.com").to_request()).await;
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
    assert_eq!(body["nickname"], "tester");
}

#[actix_web::test]
async fn test_register_rejects_duplicates_and_blanks() {
    let state = test_state();
    let app = board_app!(state);

    register_request("a@example.com", "alice").send_request(&app).await;

    let resp = register_request("a@example.com", "other").send_request(&app).await;
    assert_eq!(resp.status(), 409);
    let resp = register_request("b@example.com", "alice").send_request(&app).await;
    assert_eq!(resp.status(), 409);
    let resp = register_request("", "nobody").send_request(&app).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_check_nickname() {
    let state = test_state();
    let app = board_app!(state);
    register_request("a@example.com", "alice").send_request(&app).await;

    let resp = test::TestRequest::get()
        .uri("/api/users/check-nickname?nickname=bob")
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);

    let resp = test::TestRequest::get()
        .uri("/api/users/check-nickname?nickname=alice")
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn test_invalid_login() {
    let state = test_state();
    let app = board_app!(state);
    register_request("a@example.com", "alice").send_request(&app).await;

    let resp = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": "a@example.com", "password": "wrong" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
    let wrong_password: Value = test::read_body_json(resp).await;

    let resp = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": "nobody@example.com", "password": "password123" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
    let unknown_email: Value = test::read_body_json(resp).await;

    // Both failures look the same to the client.
    assert_eq!(wrong_password, unknown_email);
}

#[actix_web::test]
async fn test_reissue_returns_new_access_token() {
    let state = test_state();
    let app = board_app!(state);
    register_request("a@example.com", "alice").send_request(&app).await;
    let tokens: Value = test::call_and_read_body_json(&app, login_request("a@example.com").to_request()).await;

    let resp = reissue_request(&tokens["accessToken"], &tokens["refreshToken"])
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let access = &body["accessToken"];
    assert!(access.is_string());
    assert!(body.get("refreshToken").is_none());

    let claims_role = state
        .codec
        .extract_claim(access.as_str().unwrap(), "role")
        .unwrap();
    assert_eq!(claims_role, "ROLE_USER");

    // The new token opens protected routes.
    let resp = test::TestRequest::get()
        .uri("/api/getPosts")
        .insert_header(bearer(access))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_reissue_rejects_bad_refresh_token() {
    let state = test_state();
    let app = board_app!(state);
    register_request("a@example.com", "alice").send_request(&app).await;
    let tokens: Value = test::call_and_read_body_json(&app, login_request("a@example.com").to_request()).await;

    let resp = reissue_request(&tokens["accessToken"], &json!("not.a.token"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);

    // A well-formed refresh token that was never stored.
    let stray = state.codec.issue_refresh_token("a@example.com").unwrap();
    let resp = reissue_request(&tokens["accessToken"], &json!(stray))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_protected_route_without_token() {
    let state = test_state();
    let app = board_app!(state);

    let resp = test::TestRequest::get().uri("/api/getPosts").send_request(&app).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["status"], 401);

    let resp = test::TestRequest::get()
        .uri("/api/getPosts")
        .insert_header(("Authorization", "Bearer garbage"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
}
