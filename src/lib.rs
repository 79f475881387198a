//! ShopHub - Multi-vendor E-commerce Storefront Backend
//!
//! REST API over a Postgres store: product catalog, orders, sellers,
//! coupons, reviews, wishlists, disputes, returns, notifications and
//! site settings, with cookie/JWT session auth (customer, seller, admin).

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<config::Config>,
}
