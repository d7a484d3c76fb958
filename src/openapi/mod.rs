use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Silver Jewelry API",
        version = "1.0.0",
        description = r#"
# Silver Jewelry Shop API

Storefront catalog, checkout and back-office order management.

## Authentication

Storefront endpoints under `/api` are public. Everything under `/api/admin`
except `setup`, `login` and `refresh` requires an admin access token:

```
Authorization: Bearer <access-token>
```

## Money

Amounts are decimal strings with two fractional digits, e.g. `"1450.00"`.
Orders carry their currency code (UAH by default).

## Error Handling

Failures share one body shape:

```json
{
  "error": "Bad Request",
  "message": "Request validation failed",
  "fields": { "shippingAddress.postalCode": ["Postal code is required"] },
  "requestId": "3f0c6f8e-...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&SecurityAddon),
    tags(
        (name = "Products", description = "Public product catalog"),
        (name = "Categories", description = "Public category listing"),
        (name = "Orders", description = "Checkout"),
        (name = "Admin Auth", description = "Admin accounts and sessions"),
        (name = "Admin Products", description = "Catalog management"),
        (name = "Admin Categories", description = "Category management"),
        (name = "Admin Orders", description = "Order processing"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Storefront
        crate::handlers::products::list_products,
        crate::handlers::products::get_product_by_slug,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category_by_slug,
        crate::handlers::orders::create_order,

        // Admin auth
        crate::handlers::auth::setup_admin,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,

        // Admin catalog
        crate::handlers::products::admin_list_products,
        crate::handlers::products::admin_get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::add_images,
        crate::handlers::products::delete_image,
        crate::handlers::products::add_variant,
        crate::handlers::products::update_variant,
        crate::handlers::products::delete_variant,
        crate::handlers::categories::admin_list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::categories::reorder_categories,

        // Admin orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::add_tracking,

        // Health
        crate::health::health_check,
        crate::health::readiness_check,
    ),
    components(
        schemas(
            // Catalog types
            crate::entities::product::Material,
            crate::services::catalog::ProductResponse,
            crate::services::catalog::ProductListResponse,
            crate::services::catalog::VariantResponse,
            crate::services::catalog::ImageResponse,
            crate::services::catalog::CategorySummary,
            crate::services::catalog::CreateProductRequest,
            crate::services::catalog::UpdateProductRequest,
            crate::services::catalog::ImageInput,
            crate::services::catalog::AddImagesRequest,
            crate::services::catalog::CreateVariantRequest,
            crate::services::catalog::UpdateVariantRequest,
            crate::services::categories::CategoryResponse,
            crate::services::categories::CreateCategoryRequest,
            crate::services::categories::UpdateCategoryRequest,
            crate::services::categories::CategoryOrder,
            crate::services::categories::ReorderCategoriesRequest,

            // Order types
            crate::entities::order::OrderStatus,
            crate::entities::order::PaymentStatus,
            crate::entities::order::PaymentMethod,
            crate::entities::order::ShippingAddress,
            crate::entities::order_item::ProductSnapshot,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::ShippingAddressInput,
            crate::services::orders::OrderItemInput,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::AddTrackingRequest,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::services::orders::OrderListResponse,

            // Auth types
            crate::auth::SetupAdminRequest,
            crate::auth::LoginRequest,
            crate::auth::RefreshTokenRequest,
            crate::auth::AdminProfile,
            crate::auth::TokenPair,
            crate::auth::LoginResponse,
            crate::auth::AccessTokenResponse,

            // Health types
            crate::health::HealthStatus,
            crate::health::HealthDetail,
            crate::health::HealthInfo,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

/// Registers the `Bearer` scheme referenced by admin paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_storefront_and_admin_paths() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Silver Jewelry API"));
        assert!(json.contains("/api/orders"));
        assert!(json.contains("/api/admin/orders/{id}/tracking"));
        assert!(json.contains("/api/admin/categories/reorder"));
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components present");
        assert!(components.security_schemes.contains_key("Bearer"));
    }
}
