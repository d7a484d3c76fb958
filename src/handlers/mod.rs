pub mod auth;
pub mod categories;
pub mod common;
pub mod orders;
pub mod products;

use crate::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::DbPool,
    services::{catalog::CatalogService, categories::CategoryService, orders::OrderService},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub catalog: Arc<CatalogService>,
    pub categories: Arc<CategoryService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db_pool.clone(), config.order_settings())),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            auth: Arc::new(AuthService::new(AuthConfig::from(config), db_pool)),
        }
    }
}
