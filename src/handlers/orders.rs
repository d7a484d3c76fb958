use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::AuthAdmin,
    entities::order::OrderStatus,
    errors::ServiceError,
    handlers::common::{
        created_response, default_limit, default_page, success_response, AppJson,
        PaginationParams,
    },
    services::orders::{
        AddTrackingRequest, CreateOrderRequest, OrderListResponse, OrderResponse,
        UpdateOrderStatusRequest,
    },
    ApiResponse, AppState,
};

/// Checkout endpoint, open to storefront visitors
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/orders", post(create_order))
}

/// Order administration, mounted behind the auth layer
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(update_order_status))
        .route("/orders/:id/tracking", patch(add_tracking))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// Place an order
#[utoipa::path(
    post,
    path = "/api/orders",
    summary = "Create order",
    description = "Validates the cart against live stock and prices, then stores the order with product snapshots",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<OrderResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or variant not available", body = crate::errors::ErrorResponse),
        (status = 409, description = "Insufficient stock or order number conflict", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.create_order(payload).await?;
    Ok(created_response(order, "Order created successfully"))
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/admin/orders",
    summary = "List orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<OrderListResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Response, ServiceError> {
    let (page, limit) = PaginationParams::new(query.page, query.limit).normalized();
    let orders = state
        .services
        .orders
        .list_orders(query.status, page, limit)
        .await?;
    Ok(success_response(orders))
}

/// Get order
#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = ApiResponse<OrderResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(success_response(order))
}

/// Change order status
#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateOrderStatusRequest>,
) -> Result<Response, ServiceError> {
    tracing::info!(admin_id = %admin.admin_id, order_id = %id, "Admin status change requested");
    let order = state.services.orders.update_status(id, payload).await?;
    Ok(success_response(order))
}

/// Add a tracking number; the order moves to shipped
#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/tracking",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AddTrackingRequest,
    responses(
        (status = 200, description = "Tracking number recorded", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid tracking number or status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Orders"
)]
pub async fn add_tracking(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<AddTrackingRequest>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.add_tracking(id, payload).await?;
    Ok(success_response(order))
}
