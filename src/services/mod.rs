//! Business services. Each service owns an injected connection pool handle.

pub mod catalog;
pub mod categories;
pub mod order_number;
pub mod orders;
pub mod pricing;
