use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use super::order::ShippingAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "return_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Refund,
    Exchange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "return_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Requested,
    Approved,
    Rejected,
    PickedUp,
    Received,
    Refunded,
    Completed,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Requested => "requested",
            ReturnStatus::Approved => "approved",
            ReturnStatus::Rejected => "rejected",
            ReturnStatus::PickedUp => "picked_up",
            ReturnStatus::Received => "received",
            ReturnStatus::Refunded => "refunded",
            ReturnStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "refund_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    OriginalPayment,
    StoreCredit,
    BankTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Defective,
    WrongItem,
    NotAsDescribed,
    SizeIssue,
    ChangedMind,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    #[serde(alias = "productId")]
    pub product: Uuid,
    pub product_name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub price: Option<f64>,
    pub reason: ReturnReason,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub id: Uuid,
    #[serde(rename = "order")]
    pub order_id: Uuid,
    #[serde(rename = "customer")]
    pub customer_id: Uuid,
    #[serde(rename = "seller")]
    pub seller_id: Uuid,
    pub items: Json<Vec<ReturnItem>>,
    pub return_type: ReturnType,
    pub reason: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub status: ReturnStatus,
    pub refund_amount: Option<f64>,
    pub refund_method: Option<RefundMethod>,
    pub pickup_address: Option<Json<ShippingAddress>>,
    pub tracking_number: Option<String>,
    pub admin_notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
