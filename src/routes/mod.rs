//! Resource routers, one module per entity family.

use axum::routing::get;
use axum::{Json, Router};

use crate::AppState;

pub mod analytics;
pub mod auth;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod disputes;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod returns;
pub mod reviews;
pub mod sellers;
pub mod settings;
pub mod wishlist;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "shophub"})) }),
        )
        .nest("/api/auth", auth::router())
        .nest("/api/products", products::router())
        .nest("/api/categories", categories::router())
        .nest("/api/orders", orders::router())
        .nest("/api/sellers", sellers::router())
        .nest("/api/coupons", coupons::router())
        .nest("/api/reviews", reviews::router())
        .nest("/api/wishlist", wishlist::router())
        .nest("/api/notifications", notifications::router())
        .nest("/api/disputes", disputes::router())
        .nest("/api/returns", returns::router())
        .nest("/api/settings", settings::router())
        .nest("/api/analytics", analytics::router())
        .nest("/api/dashboard", dashboard::router())
}
