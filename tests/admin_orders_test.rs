mod common;

use axum::http::{Method, StatusCode};
use common::{order_payload, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

async fn seed_earrings(app: &TestApp) -> Uuid {
    app.seed_product("Hoop Earrings", dec!(320), &[], vec![])
        .await
        .id
}

async fn place_order(app: &TestApp, product_id: Uuid) -> String {
    let response = app
        .post(
            "/api/orders",
            order_payload(json!([{ "productId": product_id, "quantity": 1 }])),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.data()["id"].as_str().unwrap().to_string()
}

async fn set_status(app: &TestApp, token: &str, order_id: &str, status: &str) -> common::TestResponse {
    app.request(
        Method::PATCH,
        &format!("/api/admin/orders/{}/status", order_id),
        Some(json!({ "status": status })),
        Some(token),
    )
    .await
}

#[tokio::test]
async fn admin_order_routes_require_a_token() {
    let app = TestApp::new().await;

    let response = app.get("/api/admin/orders").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/admin/orders", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lists_orders_newest_first_with_status_filter() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let earrings = seed_earrings(&app).await;
    let first = place_order(&app, earrings).await;
    let second = place_order(&app, earrings).await;

    let confirmed = set_status(&app, &token, &first, "confirmed").await;
    assert_eq!(confirmed.status, StatusCode::OK, "{}", confirmed.body);

    let all = app
        .request(Method::GET, "/api/admin/orders?page=1&limit=10", None, Some(&token))
        .await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.data()["total"], 2);
    assert_eq!(all.data()["orders"][0]["id"], Value::String(second.clone()));

    let pending = app
        .request(Method::GET, "/api/admin/orders?status=pending", None, Some(&token))
        .await;
    assert_eq!(pending.data()["total"], 1);
    assert_eq!(pending.data()["orders"][0]["id"], Value::String(second));

    let paged = app
        .request(Method::GET, "/api/admin/orders?page=2&limit=1", None, Some(&token))
        .await;
    assert_eq!(paged.data()["orders"][0]["id"], Value::String(first));
    assert_eq!(paged.data()["totalPages"], 2);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/admin/orders/{}", Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn walks_the_fulfilment_path() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let order_id = place_order(&app, seed_earrings(&app).await).await;

    for status in ["confirmed", "processing", "shipped", "delivered"] {
        let response = set_status(&app, &token, &order_id, status).await;
        assert_eq!(response.status, StatusCode::OK, "{}: {}", status, response.body);
        assert_eq!(response.data()["status"], status);
    }

    let order = app
        .request(
            Method::GET,
            &format!("/api/admin/orders/{}", order_id),
            None,
            Some(&token),
        )
        .await;
    assert!(order.data()["shippedAt"].is_string());
    assert!(order.data()["deliveredAt"].is_string());

    let cancel = set_status(&app, &token, &order_id, "cancelled").await;
    assert_eq!(cancel.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejects_skipping_ahead() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let order_id = place_order(&app, seed_earrings(&app).await).await;

    let response = set_status(&app, &token, &order_id, "delivered").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["message"].as_str().unwrap().contains("pending"));
}

#[tokio::test]
async fn cancelled_orders_are_final() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let order_id = place_order(&app, seed_earrings(&app).await).await;

    let cancel = set_status(&app, &token, &order_id, "cancelled").await;
    assert_eq!(cancel.status, StatusCode::OK);

    let reopen = set_status(&app, &token, &order_id, "confirmed").await;
    assert_eq!(reopen.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_update_keeps_admin_notes() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let order_id = place_order(&app, seed_earrings(&app).await).await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/admin/orders/{}/status", order_id),
            Some(json!({ "status": "confirmed", "adminNotes": "Called the customer" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["adminNotes"], "Called the customer");
}

#[tokio::test]
async fn tracking_number_ships_a_confirmed_order() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let order_id = place_order(&app, seed_earrings(&app).await).await;
    let tracking_uri = format!("/api/admin/orders/{}/tracking", order_id);

    let too_early = app
        .request(
            Method::PATCH,
            &tracking_uri,
            Some(json!({ "trackingNumber": "20450000000000" })),
            Some(&token),
        )
        .await;
    assert_eq!(too_early.status, StatusCode::BAD_REQUEST);

    set_status(&app, &token, &order_id, "confirmed").await;
    let response = app
        .request(
            Method::PATCH,
            &tracking_uri,
            Some(json!({ "trackingNumber": "20450000000000" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.data()["status"], "shipped");
    assert_eq!(response.data()["trackingNumber"], "20450000000000");
    assert!(response.data()["shippedAt"].is_string());
}

#[tokio::test]
async fn blank_tracking_number_is_invalid() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let order_id = place_order(&app, seed_earrings(&app).await).await;
    set_status(&app, &token, &order_id, "confirmed").await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/admin/orders/{}/tracking", order_id),
            Some(json!({ "trackingNumber": "" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
