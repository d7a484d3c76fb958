mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};
use serde_json::json;

fn setup_body() -> serde_json::Value {
    json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD, "name": "Shop Owner" })
}

fn login_body(password: &str) -> serde_json::Value {
    json!({ "email": ADMIN_EMAIL, "password": password })
}

#[tokio::test]
async fn setup_only_works_once() {
    let app = TestApp::new().await;

    let first = app.post("/api/admin/setup", setup_body()).await;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.body);
    assert_eq!(first.data()["email"], ADMIN_EMAIL);
    assert!(first.data().get("passwordHash").is_none());

    let second = app
        .post(
            "/api/admin/setup",
            json!({ "email": "intruder@example.com", "password": "another-password", "name": "Mallory" }),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn setup_validates_input() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/admin/setup",
            json!({ "email": "nope", "password": "short", "name": "" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email() {
    let app = TestApp::new().await;
    app.post("/api/admin/setup", setup_body()).await;

    let wrong = app.post("/api/admin/login", login_body("wrong-password-123")).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = app
        .post(
            "/api/admin/login",
            json!({ "email": "ghost@example.com", "password": ADMIN_PASSWORD }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["message"], unknown.body["message"]);
}

#[tokio::test]
async fn login_then_me_and_refresh() {
    let app = TestApp::new().await;
    app.post("/api/admin/setup", setup_body()).await;

    let login = app.post("/api/admin/login", login_body(ADMIN_PASSWORD)).await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);
    let tokens = &login.data()["tokens"];
    assert_eq!(tokens["tokenType"], "Bearer");
    let access = tokens["accessToken"].as_str().unwrap().to_string();
    let refresh = tokens["refreshToken"].as_str().unwrap().to_string();

    let me = app
        .request(Method::GET, "/api/admin/me", None, Some(&access))
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["email"], ADMIN_EMAIL);

    let refreshed = app
        .post("/api/admin/refresh", json!({ "refreshToken": refresh }))
        .await;
    assert_eq!(refreshed.status, StatusCode::OK, "{}", refreshed.body);
    let new_access = refreshed.data()["accessToken"].as_str().unwrap().to_string();

    let orders = app
        .request(Method::GET, "/api/admin/orders", None, Some(&new_access))
        .await;
    assert_eq!(orders.status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = TestApp::new().await;
    app.post("/api/admin/setup", setup_body()).await;
    let login = app.post("/api/admin/login", login_body(ADMIN_PASSWORD)).await;
    let refresh = login.data()["tokens"]["refreshToken"].as_str().unwrap().to_string();
    let access = login.data()["tokens"]["accessToken"].as_str().unwrap().to_string();

    let me = app
        .request(Method::GET, "/api/admin/me", None, Some(&refresh))
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let swapped = app
        .post("/api/admin/refresh", json!({ "refreshToken": access }))
        .await;
    assert_eq!(swapped.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() {
    let app = TestApp::new().await;
    app.post("/api/admin/setup", setup_body()).await;
    let login = app.post("/api/admin/login", login_body(ADMIN_PASSWORD)).await;
    let access = login.data()["tokens"]["accessToken"].as_str().unwrap().to_string();
    let refresh = login.data()["tokens"]["refreshToken"].as_str().unwrap().to_string();

    let logout = app
        .request(
            Method::POST,
            "/api/admin/logout",
            Some(json!({ "refreshToken": refresh })),
            Some(&access),
        )
        .await;
    assert_eq!(logout.status, StatusCode::OK, "{}", logout.body);

    let refreshed = app
        .post("/api/admin/refresh", json!({ "refreshToken": refresh }))
        .await;
    assert_eq!(refreshed.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_and_docs_are_public() {
    let app = TestApp::new().await;

    let health = app.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);

    let docs = app.get("/api-docs/openapi.json").await;
    assert_eq!(docs.status, StatusCode::OK);
    assert!(docs.body["paths"].get("/api/orders").is_some());
}

#[tokio::test]
async fn responses_echo_a_request_id() {
    let app = TestApp::new().await;

    let response = app.get("/api/products").await;

    assert!(response.headers.contains_key("x-request-id"));
    assert!(response.body["meta"]["requestId"].is_string());
}
