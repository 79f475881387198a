use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;

/// Closed set of notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderPlaced,
    OrderConfirmed,
    OrderShipped,
    OrderDelivered,
    OrderCancelled,
    ProductApproved,
    ProductRejected,
    SellerApproved,
    SellerRejected,
    NewReview,
    LowStock,
    DisputeOpened,
    DisputeResolved,
    PaymentReceived,
    PayoutProcessed,
    PriceDrop,
    BackInStock,
    SystemAlert,
    Promotion,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "recipient")]
    pub recipient_id: Uuid,
    pub recipient_role: UserRole,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub icon: Option<String>,
    pub related_order: Option<Uuid>,
    pub related_product: Option<Uuid>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payload for the best-effort notification side-effect writes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(alias = "recipient")]
    pub recipient_id: Uuid,
    pub recipient_role: UserRole,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub related_order: Option<Uuid>,
    #[serde(default)]
    pub related_product: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::DisputeOpened).unwrap(),
            r#""dispute_opened""#
        );
        assert_eq!(
            serde_json::from_str::<NotificationKind>(r#""new_review""#).unwrap(),
            NotificationKind::NewReview
        );
    }
}
