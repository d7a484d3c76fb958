#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use silver_jewelry_api::{
    auth::{LoginRequest, SetupAdminRequest},
    build_router,
    config::AppConfig,
    db,
    services::{
        catalog::{CreateProductRequest, CreateVariantRequest, ImageInput, ProductResponse},
        categories::{CategoryResponse, CreateCategoryRequest},
    },
    AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "owner@jewelry.test";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Response captured from the router with its body decoded as JSON
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// Helper harness for spinning up the application against a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("shop.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_access_secret_for_integration_runs_7xq2".to_string(),
            "test_refresh_secret_for_integration_runs_m4p9".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 4;
        cfg.db_min_connections = 1;
        customize(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body), None).await
    }

    /// Creates the first admin if needed and returns a fresh access token.
    pub async fn admin_token(&self) -> String {
        let auth = self.state.services.auth.clone();
        let _ = auth
            .setup_first_admin(SetupAdminRequest {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                name: "Shop Owner".to_string(),
            })
            .await;
        auth.login(LoginRequest {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        })
        .await
        .expect("admin login")
        .tokens
        .access_token
    }

    pub async fn seed_category(&self, name: &str) -> CategoryResponse {
        self.state
            .services
            .categories
            .create(CreateCategoryRequest {
                name: name.to_string(),
                slug: None,
                description: None,
                image_url: None,
                display_order: None,
                is_active: Some(true),
            })
            .await
            .expect("seed category")
    }

    /// Seeds an available product; each variant is `(name, price adjustment, stock)`.
    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        variants: &[(&str, Decimal, i32)],
        category_ids: Vec<Uuid>,
    ) -> ProductResponse {
        self.state
            .services
            .catalog
            .create_product(CreateProductRequest {
                name: name.to_string(),
                slug: None,
                description: format!("{} for integration tests", name),
                price,
                compare_at_price: None,
                weight: Decimal::from(3),
                material: Default::default(),
                is_available: Some(true),
                is_featured: Some(false),
                is_new_arrival: Some(false),
                category_ids,
                variants: variants
                    .iter()
                    .map(|(variant, adjustment, stock)| CreateVariantRequest {
                        name: variant.to_string(),
                        price_adjustment: *adjustment,
                        stock_quantity: *stock,
                        is_available: Some(true),
                    })
                    .collect(),
                images: vec![ImageInput {
                    url: format!("https://cdn.example.com/{}.jpg", Uuid::new_v4()),
                    alt_text: Some(name.to_string()),
                }],
            })
            .await
            .expect("seed product")
    }
}

/// Checkout payload with valid customer details and the given cart lines
pub fn order_payload(items: Value) -> Value {
    json!({
        "customerName": "Olena Kovalenko",
        "customerEmail": "olena@example.com",
        "customerPhone": "+380501234567",
        "paymentMethod": "cash_on_delivery",
        "shippingAddress": {
            "city": "Kyiv",
            "address": "Khreshchatyk St, 1",
            "postalCode": "01001"
        },
        "customerNotes": "Gift wrap, please",
        "items": items
    })
}

/// Money fields are serialized as decimal strings
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a money value, got {other}"),
    }
}
