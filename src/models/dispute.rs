use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use super::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dispute_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeType {
    ProductIssue,
    DeliveryIssue,
    RefundRequest,
    WrongItem,
    DamagedItem,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dispute_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
    Escalated,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "open",
            DisputeStatus::InProgress => "in_progress",
            DisputeStatus::Resolved => "resolved",
            DisputeStatus::Closed => "closed",
            DisputeStatus::Escalated => "escalated",
        }
    }

    /// Resolved and closed disputes get a resolution timestamp.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DisputeStatus::Resolved | DisputeStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dispute_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DisputePriority {
    Low,
    Medium,
    High,
}

/// One entry in a dispute's append-only message thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeMessage {
    pub sender: Uuid,
    pub sender_type: UserRole,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: Uuid,
    #[serde(rename = "order")]
    pub order_id: Uuid,
    #[serde(rename = "customer")]
    pub customer_id: Uuid,
    #[serde(rename = "seller")]
    pub seller_id: Uuid,
    #[serde(rename = "type")]
    pub dispute_type: DisputeType,
    pub subject: String,
    pub description: String,
    pub images: Vec<String>,
    pub status: DisputeStatus,
    pub priority: DisputePriority,
    pub resolution: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub messages: Json<Vec<DisputeMessage>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_stamp_resolution() {
        assert!(DisputeStatus::Resolved.is_terminal());
        assert!(DisputeStatus::Closed.is_terminal());
        assert!(!DisputeStatus::Open.is_terminal());
        assert!(!DisputeStatus::InProgress.is_terminal());
        assert!(!DisputeStatus::Escalated.is_terminal());
    }

    #[test]
    fn status_wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&DisputeStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        assert_eq!(DisputeStatus::InProgress.as_str(), "in_progress");
    }
}
