use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    #[serde(rename = "product")]
    pub product_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    /// 1 to 5 stars, enforced by a check constraint.
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
