//! Silver Jewelry API Library
//!
//! Storefront catalog, checkout and order administration for the silver
//! jewelry shop.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use http::{header, HeaderValue, Method};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    /// Success without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Assembles the HTTP application: public storefront routes under `/api`,
/// admin routes under `/api/admin`, health probes and the API docs.
pub fn build_router(state: AppState) -> Router {
    let auth_service = state.services.auth.clone();

    let storefront = Router::new()
        .route("/", get(api_info))
        .merge(handlers::products::public_routes())
        .merge(handlers::categories::public_routes())
        .merge(handlers::orders::public_routes());

    let protected = Router::new()
        .merge(handlers::auth::session_routes())
        .merge(handlers::products::admin_routes())
        .merge(handlers::categories::admin_routes())
        .merge(handlers::orders::admin_routes())
        .with_auth(auth_service);

    let admin = handlers::auth::public_routes().merge(protected);

    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));
    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api", storefront.nest("/admin", admin))
        .merge(health::health_routes(state.db.clone()))
        .merge(openapi::swagger_ui())
        .fallback(route_not_found)
        .with_state(state)
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn api_info() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/swagger-ui",
    })))
}

async fn route_not_found() -> Response {
    let body = errors::ErrorResponse {
        error: "Not Found".to_string(),
        message: "Route not found".to_string(),
        details: None,
        fields: None,
        request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
        timestamp: Utc::now().to_rfc3339(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

pub mod prelude {
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::health::*;
    pub use crate::openapi::*;
    pub use crate::tracing::*;
    pub use crate::{build_router, ApiResponse, AppState};
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn message_response_omits_data() {
        let value = serde_json::to_value(ApiResponse::<()>::message("Category deleted")).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Category deleted");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn created_message_is_kept_with_data() {
        let value =
            serde_json::to_value(ApiResponse::success_with_message(7, "Order created")).unwrap();
        assert_eq!(value["data"], 7);
        assert_eq!(value["message"], "Order created");
    }
}
