//! Typed rows for every stored entity.
//!
//! Closed status sets are Postgres enums mirrored by `sqlx::Type` derives;
//! flexible sub-documents (addresses, order line items, dispute message
//! threads, setting values) live in JSONB columns decoded through
//! `sqlx::types::Json`.

pub mod category;
pub mod coupon;
pub mod dispute;
pub mod notification;
pub mod order;
pub mod product;
pub mod returns;
pub mod review;
pub mod seller;
pub mod site_setting;
pub mod user;
