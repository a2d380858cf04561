//! HTTP API handlers for receipt-ocr

pub mod auth;
pub mod health;
pub mod ocr;

pub use auth::auth_middleware;
pub use health::health_routes;
pub use ocr::ocr_routes;
