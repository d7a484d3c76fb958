use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, patch, put},
    Router,
};
use uuid::Uuid;

use crate::{
    auth::AuthAdmin,
    errors::ServiceError,
    handlers::common::{created_response, message_response, success_response, AppJson},
    services::categories::{
        CategoryResponse, CreateCategoryRequest, ReorderCategoriesRequest, UpdateCategoryRequest,
    },
    ApiResponse, AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:slug", get(get_category_by_slug))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(admin_list_categories).post(create_category),
        )
        // Registered before `:id` so the literal segment wins
        .route("/categories/reorder", patch(reorder_categories))
        .route(
            "/categories/:id",
            put(update_category).delete(delete_category),
        )
}

/// Active categories in display order
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryResponse>>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let categories = state.services.categories.list_active().await?;
    Ok(success_response(categories))
}

#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServiceError> {
    let category = state.services.categories.get_by_slug(&slug).await?;
    Ok(success_response(category))
}

#[utoipa::path(
    get,
    path = "/api/admin/categories",
    responses(
        (status = 200, description = "All categories", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Categories"
)]
pub async fn admin_list_categories(
    State(state): State<AppState>,
    _admin: AuthAdmin,
) -> Result<Response, ServiceError> {
    let categories = state.services.categories.list_all().await?;
    Ok(success_response(categories))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name or slug already taken", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<Response, ServiceError> {
    let category = state.services.categories.create(payload).await?;
    Ok(created_response(category, "Category created"))
}

#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name or slug already taken", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Response, ServiceError> {
    let category = state.services.categories.update(id, payload).await?;
    Ok(success_response(category))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has products", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.categories.delete(id).await?;
    Ok(message_response("Category deleted"))
}

#[utoipa::path(
    patch,
    path = "/api/admin/categories/reorder",
    request_body = ReorderCategoriesRequest,
    responses(
        (status = 200, description = "New order applied", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 404, description = "Unknown category", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin Categories"
)]
pub async fn reorder_categories(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    AppJson(payload): AppJson<ReorderCategoriesRequest>,
) -> Result<Response, ServiceError> {
    let categories = state.services.categories.reorder(payload).await?;
    Ok(success_response(categories))
}
