use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seller_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SellerStatus {
    Pending,
    Approved,
    Blocked,
}

/// Storefront profile, 1:1 with a user whose role is `seller`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: Uuid,
    pub user_id: Uuid,
    pub store_name: String,
    pub store_description: Option<String>,
    pub store_logo: Option<String>,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub status: SellerStatus,
    pub rating: f64,
    pub total_sales: i64,
    pub total_revenue: f64,
    /// Platform commission, percent.
    pub commission: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub id: Uuid,
    pub store_name: String,
    pub rating: f64,
}
