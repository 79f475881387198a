//! Order disputes with an append-only message thread. Opening a dispute
//! notifies the seller; status changes notify the customer. Both
//! notifications are best-effort.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::dispute::{
    Dispute, DisputeMessage, DisputePriority, DisputeStatus, DisputeType,
};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::order::Order;
use crate::models::user::UserRole;
use crate::routes::notifications::create_notification;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_disputes).post(create_dispute))
        .route("/seller/:sellerId", get(list_for_seller))
        .route("/customer/:customerId", get(list_for_customer))
        .route("/:id/message", post(add_message))
        .route("/:id/status", patch(update_status))
}

/// Dispute with its counterparties and order expanded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeView {
    #[serde(flatten)]
    pub dispute: Dispute,
    pub customer_username: String,
    pub customer_email: String,
    pub store_name: String,
    pub order_details: Option<Order>,
}

#[derive(Debug, sqlx::FromRow)]
struct DisputeRow {
    #[sqlx(flatten)]
    dispute: Dispute,
    customer_username: String,
    customer_email: String,
    store_name: String,
}

/// Expands each row's order reference in one batched query.
async fn into_views(db: &PgPool, rows: Vec<DisputeRow>) -> Result<Vec<DisputeView>, ApiError> {
    let order_ids: Vec<Uuid> = rows.iter().map(|r| r.dispute.order_id).collect();
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ANY($1)")
        .bind(&order_ids)
        .fetch_all(db)
        .await?;
    let mut by_id: HashMap<Uuid, Order> = orders.into_iter().map(|o| (o.id, o)).collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let order_details = by_id.remove(&row.dispute.order_id);
            DisputeView {
                dispute: row.dispute,
                customer_username: row.customer_username,
                customer_email: row.customer_email,
                store_name: row.store_name,
                order_details,
            }
        })
        .collect())
}

const LIST_SQL: &str = "SELECT d.*, u.username AS customer_username, u.email AS customer_email, \
       s.store_name \
     FROM disputes d \
     JOIN users u ON u.id = d.customer_id \
     JOIN sellers s ON s.id = d.seller_id";

#[derive(Debug, Deserialize)]
pub struct DisputeFilter {
    pub status: Option<DisputeStatus>,
    pub priority: Option<DisputePriority>,
}

async fn list_disputes(
    State(state): State<AppState>,
    Query(filter): Query<DisputeFilter>,
) -> Result<Json<Vec<DisputeView>>, ApiError> {
    let sql = format!(
        "{LIST_SQL} WHERE ($1::dispute_status IS NULL OR d.status = $1) \
         AND ($2::dispute_priority IS NULL OR d.priority = $2) \
         ORDER BY d.created_at DESC"
    );
    let rows = sqlx::query_as::<_, DisputeRow>(&sql)
        .bind(filter.status)
        .bind(filter.priority)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(into_views(&state.db, rows).await?))
}

async fn list_for_seller(
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
) -> Result<Json<Vec<DisputeView>>, ApiError> {
    let sql = format!("{LIST_SQL} WHERE d.seller_id = $1 ORDER BY d.created_at DESC");
    let rows = sqlx::query_as::<_, DisputeRow>(&sql)
        .bind(seller_id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(into_views(&state.db, rows).await?))
}

async fn list_for_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<DisputeView>>, ApiError> {
    let sql = format!("{LIST_SQL} WHERE d.customer_id = $1 ORDER BY d.created_at DESC");
    let rows = sqlx::query_as::<_, DisputeRow>(&sql)
        .bind(customer_id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(into_views(&state.db, rows).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDispute {
    #[serde(alias = "orderId")]
    pub order: Uuid,
    #[serde(alias = "customerId")]
    pub customer: Uuid,
    #[serde(alias = "sellerId")]
    pub seller: Uuid,
    #[serde(rename = "type")]
    pub dispute_type: DisputeType,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub priority: Option<DisputePriority>,
}

async fn create_dispute(
    State(state): State<AppState>,
    Json(body): Json<CreateDispute>,
) -> Result<(StatusCode, Json<Dispute>), ApiError> {
    let dispute = sqlx::query_as::<_, Dispute>(
        "INSERT INTO disputes (id, order_id, customer_id, seller_id, dispute_type, subject, \
           description, images, priority) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 'medium'::dispute_priority)) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(body.order)
    .bind(body.customer)
    .bind(body.seller)
    .bind(body.dispute_type)
    .bind(&body.subject)
    .bind(&body.description)
    .bind(&body.images)
    .bind(body.priority)
    .fetch_one(&state.db)
    .await?;

    if let Some((seller_user,)) =
        sqlx::query_as::<_, (Uuid,)>("SELECT user_id FROM sellers WHERE id = $1")
            .bind(dispute.seller_id)
            .fetch_optional(&state.db)
            .await?
    {
        create_notification(
            &state.db,
            NewNotification {
                recipient_id: seller_user,
                recipient_role: UserRole::Seller,
                kind: NotificationKind::DisputeOpened,
                title: "New Dispute Opened".to_string(),
                message: format!("Customer has opened a dispute: {}", dispute.subject),
                link: None,
                icon: None,
                related_order: Some(dispute.order_id),
                related_product: None,
            },
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(dispute)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMessage {
    pub sender: Uuid,
    pub sender_type: UserRole,
    pub message: String,
}

async fn add_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddMessage>,
) -> Result<Json<Dispute>, ApiError> {
    let entry = DisputeMessage {
        sender: body.sender,
        sender_type: body.sender_type,
        message: body.message,
        timestamp: Utc::now(),
    };

    let dispute = sqlx::query_as::<_, Dispute>(
        "UPDATE disputes SET messages = messages || $2::jsonb, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(Jsonb(entry))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Dispute not found".to_string()))?;
    Ok(Json(dispute))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDisputeStatus {
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<Uuid>,
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateDisputeStatus>,
) -> Result<Json<Dispute>, ApiError> {
    let dispute = sqlx::query_as::<_, Dispute>(
        "UPDATE disputes SET \
           status = $2, \
           resolution = COALESCE($3, resolution), \
           resolved_by = COALESCE($4, resolved_by), \
           resolved_at = CASE WHEN $5 THEN NOW() ELSE resolved_at END, \
           updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(body.status)
    .bind(&body.resolution)
    .bind(body.resolved_by)
    .bind(body.status.is_terminal())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Dispute not found".to_string()))?;

    create_notification(
        &state.db,
        NewNotification {
            recipient_id: dispute.customer_id,
            recipient_role: UserRole::Customer,
            kind: NotificationKind::DisputeResolved,
            title: "Dispute Updated".to_string(),
            message: format!("Your dispute has been {}", dispute.status.as_str()),
            link: None,
            icon: None,
            related_order: Some(dispute.order_id),
            related_product: None,
        },
    )
    .await;

    Ok(Json(dispute))
}
