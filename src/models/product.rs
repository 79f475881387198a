use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
}

/// Catalog product. `rating` and `review_count` are a derived aggregate,
/// recomputed synchronously on every review mutation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
    pub category: Option<String>,
    pub stock: i32,
    #[serde(rename = "seller")]
    pub seller_id: Option<Uuid>,
    pub status: ProductStatus,
    pub rating: f64,
    pub review_count: i64,
    pub sold: i64,
    pub created_at: DateTime<Utc>,
}

/// Trimmed projection returned by the paginated catalog listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub images: Vec<String>,
    pub category: Option<String>,
    pub rating: f64,
    pub sold: i64,
    pub stock: i32,
}
