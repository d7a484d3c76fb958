mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{money, order_payload, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

#[tokio::test]
async fn checkout_prices_lines_and_charges_flat_shipping() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Moonstone Ring", dec!(180), &[("17", dec!(20), 5)], vec![])
        .await;
    let variant = &product.variants[0];

    let response = app
        .post(
            "/api/orders",
            order_payload(json!([
                { "productId": product.id, "variantId": variant.id, "quantity": 2 }
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["success"], true);

    let order = response.data();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentStatus"], "pending");
    assert_eq!(order["paymentMethod"], "cash_on_delivery");
    assert_eq!(order["customerEmail"], "olena@example.com");
    assert_eq!(order["shippingAddress"]["postalCode"], "01001");
    assert_eq!(money(&order["subtotal"]), dec!(400));
    assert_eq!(money(&order["shippingCost"]), dec!(80));
    assert_eq!(money(&order["total"]), dec!(480));

    let item = &order["items"][0];
    assert_eq!(item["quantity"], 2);
    assert_eq!(money(&item["unitPrice"]), dec!(200));
    assert_eq!(money(&item["subtotal"]), dec!(400));
    assert_eq!(item["productSnapshot"]["name"], "Moonstone Ring");
    assert_eq!(item["productSnapshot"]["variantName"], "17");
    assert!(item["productSnapshot"]["image"]
        .as_str()
        .unwrap()
        .starts_with("https://cdn.example.com/"));
}

#[tokio::test]
async fn items_keep_cart_order() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let names = ["Zircon Pendant", "Amber Ring", "Opal Studs"];
    let mut lines = Vec::new();
    for name in names {
        let product = app.seed_product(name, dec!(100), &[], vec![]).await;
        lines.push(json!({ "productId": product.id, "quantity": 1 }));
    }

    let created = app.post("/api/orders", order_payload(json!(lines))).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let order_id = created.data()["id"].as_str().unwrap().to_string();

    let fetched = app
        .request(
            Method::GET,
            &format!("/api/admin/orders/{}", order_id),
            None,
            Some(&token),
        )
        .await;
    let items = fetched.data()["items"].as_array().unwrap();
    let snapshot_names: Vec<&str> = items
        .iter()
        .map(|item| item["productSnapshot"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(snapshot_names, names);
    let line_numbers: Vec<i64> = items
        .iter()
        .map(|item| item["lineNumber"].as_i64().unwrap())
        .collect();
    assert_eq!(line_numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn checkout_at_threshold_ships_free() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Silver Chain", dec!(1250), &[], vec![])
        .await;

    let response = app
        .post(
            "/api/orders",
            order_payload(json!([{ "productId": product.id, "quantity": 2 }])),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let order = response.data();
    assert_eq!(money(&order["subtotal"]), dec!(2500));
    assert_eq!(money(&order["shippingCost"]), Decimal::ZERO);
    assert_eq!(money(&order["total"]), dec!(2500));
    assert!(order["items"][0]["variantId"].is_null());
}

#[tokio::test]
async fn order_numbers_follow_daily_sequence() {
    let app = TestApp::new().await;
    let product = app.seed_product("Stud Earrings", dec!(350), &[], vec![]).await;
    let payload = order_payload(json!([{ "productId": product.id, "quantity": 1 }]));

    let first = app.post("/api/orders", payload.clone()).await;
    let second = app.post("/api/orders", payload).await;

    let day = Utc::now().format("%Y-%m-%d").to_string();
    assert_eq!(first.data()["orderNumber"], format!("SJ-{}-0001", day));
    assert_eq!(second.data()["orderNumber"], format!("SJ-{}-0002", day));
}

#[tokio::test]
async fn unavailable_product_rejects_whole_order() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let listed = app.seed_product("Bangle", dec!(600), &[], vec![]).await;
    let hidden = app.seed_product("Old Bangle", dec!(400), &[], vec![]).await;

    let hide = app
        .request(
            Method::PUT,
            &format!("/api/admin/products/{}", hidden.id),
            Some(json!({ "isAvailable": false })),
            Some(&token),
        )
        .await;
    assert_eq!(hide.status, StatusCode::OK, "{}", hide.body);

    let response = app
        .post(
            "/api/orders",
            order_payload(json!([
                { "productId": listed.id, "quantity": 1 },
                { "productId": hidden.id, "quantity": 1 }
            ])),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Not Found");
    assert!(response.body["message"].as_str().unwrap().contains("not available"));

    let orders = app
        .request(Method::GET, "/api/admin/orders", None, Some(&token))
        .await;
    assert_eq!(orders.data()["total"], 0);
}

#[tokio::test]
async fn insufficient_stock_is_a_conflict() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Signet Ring", dec!(900), &[("19", Decimal::ZERO, 1)], vec![])
        .await;
    let variant_id = product.variants[0].id;

    let response = app
        .post(
            "/api/orders",
            order_payload(json!([
                { "productId": product.id, "variantId": variant_id, "quantity": 1 },
                { "productId": product.id, "variantId": variant_id, "quantity": 1 }
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);

    let token = app.admin_token().await;
    let orders = app
        .request(Method::GET, "/api/admin/orders", None, Some(&token))
        .await;
    assert_eq!(orders.data()["total"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_all_get_unique_numbers() {
    let app = Arc::new(TestApp::new().await);
    let product = app.seed_product("Locket", dec!(540), &[], vec![]).await;
    let payload = order_payload(json!([{ "productId": product.id, "quantity": 1 }]));

    let mut checkouts = JoinSet::new();
    for _ in 0..8 {
        let app = app.clone();
        let payload = payload.clone();
        checkouts.spawn(async move { app.post("/api/orders", payload).await });
    }

    let mut numbers = HashSet::new();
    while let Some(joined) = checkouts.join_next().await {
        let response = joined.expect("checkout task panicked");
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        numbers.insert(response.data()["orderNumber"].as_str().unwrap().to_string());
    }
    assert_eq!(numbers.len(), 8);

    let day = Utc::now().format("%Y-%m-%d").to_string();
    assert!(numbers.contains(&format!("SJ-{}-0008", day)));
}

#[tokio::test]
async fn variant_from_another_product_is_not_found() {
    let app = TestApp::new().await;
    let ring = app
        .seed_product("Ring", dec!(300), &[("16", Decimal::ZERO, 3)], vec![])
        .await;
    let pendant = app.seed_product("Pendant", dec!(300), &[], vec![]).await;

    let response = app
        .post(
            "/api/orders",
            order_payload(json!([
                { "productId": pendant.id, "variantId": ring.variants[0].id, "quantity": 1 }
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stock_is_left_alone_unless_reservation_is_enabled() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app
        .seed_product("Cuff", dec!(700), &[("M", Decimal::ZERO, 4)], vec![])
        .await;

    let response = app
        .post(
            "/api/orders",
            order_payload(json!([
                { "productId": product.id, "variantId": product.variants[0].id, "quantity": 3 }
            ])),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let fetched = app
        .request(
            Method::GET,
            &format!("/api/admin/products/{}", product.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(fetched.data()["variants"][0]["stockQuantity"], 4);
}

#[tokio::test]
async fn reservation_decrements_variant_stock() {
    let app = TestApp::with_config(|cfg| cfg.reserve_stock_on_order = true).await;
    let token = app.admin_token().await;
    let product = app
        .seed_product("Cuff", dec!(700), &[("M", Decimal::ZERO, 4)], vec![])
        .await;
    let line = json!([
        { "productId": product.id, "variantId": product.variants[0].id, "quantity": 3 }
    ]);

    let first = app.post("/api/orders", order_payload(line.clone())).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let fetched = app
        .request(
            Method::GET,
            &format!("/api/admin/products/{}", product.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(fetched.data()["variants"][0]["stockQuantity"], 1);

    let second = app.post("/api/orders", order_payload(line)).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn snapshot_survives_product_edits() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.seed_product("Anklet", dec!(250), &[], vec![]).await;

    let created = app
        .post(
            "/api/orders",
            order_payload(json!([{ "productId": product.id, "quantity": 1 }])),
        )
        .await;
    let order_id = created.data()["id"].as_str().unwrap().to_string();

    let edit = app
        .request(
            Method::PUT,
            &format!("/api/admin/products/{}", product.id),
            Some(json!({ "name": "Renamed Anklet", "price": "999.00" })),
            Some(&token),
        )
        .await;
    assert_eq!(edit.status, StatusCode::OK, "{}", edit.body);

    let order = app
        .request(
            Method::GET,
            &format!("/api/admin/orders/{}", order_id),
            None,
            Some(&token),
        )
        .await;
    let item = &order.data()["items"][0];
    assert_eq!(item["productSnapshot"]["name"], "Anklet");
    assert_eq!(money(&item["productSnapshot"]["price"]), dec!(250));
    assert_eq!(money(&item["unitPrice"]), dec!(250));
}

#[tokio::test]
async fn invalid_checkout_reports_fields() {
    let app = TestApp::new().await;

    let mut payload = order_payload(json!([]));
    payload["customerEmail"] = json!("not-an-email");
    payload["shippingAddress"]["postalCode"] = json!("   ");

    let response = app.post("/api/orders", payload).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields = &response.body["fields"];
    assert!(fields.get("customerEmail").is_some(), "{}", response.body);
    assert!(fields.get("shippingAddress.postalCode").is_some(), "{}", response.body);
    assert!(fields.get("items").is_some(), "{}", response.body);
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("Brooch", dec!(450), &[], vec![]).await;

    let response = app
        .post(
            "/api/orders",
            order_payload(json!([{ "productId": product.id, "quantity": 0 }])),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["fields"].get("items[0].quantity").is_some());
}
