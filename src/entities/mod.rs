//! sea-orm entities for the storefront schema.

pub mod admin;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_category;
pub mod product_image;
pub mod product_variant;
pub mod refresh_token;
