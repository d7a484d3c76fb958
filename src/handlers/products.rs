use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::AuthAdmin,
    errors::ServiceError,
    handlers::common::{
        created_response, default_limit, default_page, message_response, success_response,
        AppJson, PaginationParams,
    },
    services::catalog::{
        AddImagesRequest, CreateProductRequest, CreateVariantRequest, ImageResponse,
        ProductFilter, ProductListResponse, ProductResponse, UpdateProductRequest,
        UpdateVariantRequest, VariantResponse,
    },
    ApiResponse, AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:slug", get(get_product_by_slug))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin_list_products).post(create_product))
        .route(
            "/products/:id",
            get(admin_get_product)
                .put(update_product)
                .delete(delete_product),
        )
        .route("/products/:id/images", post(add_images))
        .route("/products/:id/images/:image_id", delete(delete_image))
        .route("/products/:id/variants", post(add_variant))
        .route("/variants/:id", put(update_variant).delete(delete_variant))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub category_id: Option<Uuid>,
    pub featured: Option<bool>,
    pub new_arrival: Option<bool>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl ProductListQuery {
    fn into_filter(self, include_unavailable: bool) -> (ProductFilter, u64, u64) {
        let (page, limit) = PaginationParams::new(self.page, self.limit).normalized();
        let filter = ProductFilter {
            category_id: self.category_id,
            featured: self.featured,
            new_arrival: self.new_arrival,
            include_unavailable,
        };
        (filter, page, limit)
    }
}

/// List available products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products retrieved successfully", body = ApiResponse<ProductListResponse>),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Response, ServiceError> {
    let (filter, page, limit) = query.into_filter(false);
    let products = state
        .services
        .catalog
        .list_products(filter, page, limit)
        .await?;
    Ok(success_response(products))
}

/// Get an available product by slug
#[utoipa::path(
    get,
    path = "/api/products/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServiceError> {
    let product = state.services.catalog.get_by_slug(&slug).await?;
    Ok(success_response(product))
}

/// List all products, including unavailable ones
#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products retrieved successfully", body = ApiResponse<ProductListResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn admin_list_products(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(query): Query<ProductListQuery>,
) -> Result<Response, ServiceError> {
    let (filter, page, limit) = query.into_filter(true);
    let products = state
        .services
        .catalog
        .list_products(filter, page, limit)
        .await?;
    Ok(success_response(products))
}

#[utoipa::path(
    get,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn admin_get_product(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(success_response(product))
}

/// Create a product with optional categories, variants and images
#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already taken", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    AppJson(payload): AppJson<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    let product = state.services.catalog.create_product(payload).await?;
    Ok(created_response(product, "Product created"))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already taken", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateProductRequest>,
) -> Result<Response, ServiceError> {
    let product = state.services.catalog.update_product(id, payload).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product has orders", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.catalog.delete_product(id).await?;
    Ok(message_response("Product deleted"))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/images",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = AddImagesRequest,
    responses(
        (status = 201, description = "Images added", body = ApiResponse<Vec<ImageResponse>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn add_images(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<AddImagesRequest>,
) -> Result<Response, ServiceError> {
    let images = state.services.catalog.add_images(id, payload).await?;
    Ok(created_response(images, "Images added"))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}/images/{image_id}",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ServiceError> {
    state.services.catalog.delete_image(id, image_id).await?;
    Ok(message_response("Image deleted"))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/variants",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = CreateVariantRequest,
    responses(
        (status = 201, description = "Variant added", body = ApiResponse<VariantResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn add_variant(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CreateVariantRequest>,
) -> Result<Response, ServiceError> {
    let variant = state.services.catalog.add_variant(id, payload).await?;
    Ok(created_response(variant, "Variant added"))
}

#[utoipa::path(
    put,
    path = "/api/admin/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant ID")),
    request_body = UpdateVariantRequest,
    responses(
        (status = 200, description = "Variant updated", body = ApiResponse<VariantResponse>),
        (status = 404, description = "Variant not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn update_variant(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateVariantRequest>,
) -> Result<Response, ServiceError> {
    let variant = state.services.catalog.update_variant(id, payload).await?;
    Ok(success_response(variant))
}

#[utoipa::path(
    delete,
    path = "/api/admin/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Variant deleted"),
        (status = 404, description = "Variant not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Products"
)]
pub async fn delete_variant(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.catalog.delete_variant(id).await?;
    Ok(message_response("Variant deleted"))
}
