//! Return requests. Creation notifies the seller; status changes notify the
//! customer. Approval and refund stamp their own timestamps.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as Jsonb;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::order::{Order, ShippingAddress};
use crate::models::returns::{RefundMethod, ReturnItem, ReturnRequest, ReturnStatus, ReturnType};
use crate::models::user::UserRole;
use crate::routes::notifications::create_notification;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_returns).post(create_return))
        .route("/seller/:sellerId", get(list_for_seller))
        .route("/customer/:customerId", get(list_for_customer))
        .route("/:id/status", patch(update_status))
        .route("/:id", axum::routing::delete(delete_return))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnView {
    #[serde(flatten)]
    pub request: ReturnRequest,
    pub customer_username: String,
    pub customer_email: String,
    pub store_name: String,
    pub order_details: Option<Order>,
}

#[derive(Debug, sqlx::FromRow)]
struct ReturnRow {
    #[sqlx(flatten)]
    request: ReturnRequest,
    customer_username: String,
    customer_email: String,
    store_name: String,
}

const LIST_SQL: &str = "SELECT r.*, u.username AS customer_username, u.email AS customer_email, \
       s.store_name \
     FROM returns r \
     JOIN users u ON u.id = r.customer_id \
     JOIN sellers s ON s.id = r.seller_id";

async fn into_views(db: &PgPool, rows: Vec<ReturnRow>) -> Result<Vec<ReturnView>, ApiError> {
    let order_ids: Vec<Uuid> = rows.iter().map(|r| r.request.order_id).collect();
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ANY($1)")
        .bind(&order_ids)
        .fetch_all(db)
        .await?;
    let mut by_id: HashMap<Uuid, Order> = orders.into_iter().map(|o| (o.id, o)).collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let order_details = by_id.remove(&row.request.order_id);
            ReturnView {
                request: row.request,
                customer_username: row.customer_username,
                customer_email: row.customer_email,
                store_name: row.store_name,
                order_details,
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct ReturnFilter {
    pub status: Option<ReturnStatus>,
}

async fn list_returns(
    State(state): State<AppState>,
    Query(filter): Query<ReturnFilter>,
) -> Result<Json<Vec<ReturnView>>, ApiError> {
    let sql = format!(
        "{LIST_SQL} WHERE ($1::return_status IS NULL OR r.status = $1) ORDER BY r.created_at DESC"
    );
    let rows = sqlx::query_as::<_, ReturnRow>(&sql)
        .bind(filter.status)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(into_views(&state.db, rows).await?))
}

async fn list_for_seller(
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
) -> Result<Json<Vec<ReturnView>>, ApiError> {
    let sql = format!("{LIST_SQL} WHERE r.seller_id = $1 ORDER BY r.created_at DESC");
    let rows = sqlx::query_as::<_, ReturnRow>(&sql)
        .bind(seller_id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(into_views(&state.db, rows).await?))
}

async fn list_for_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<ReturnView>>, ApiError> {
    let sql = format!("{LIST_SQL} WHERE r.customer_id = $1 ORDER BY r.created_at DESC");
    let rows = sqlx::query_as::<_, ReturnRow>(&sql)
        .bind(customer_id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(into_views(&state.db, rows).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturn {
    #[serde(alias = "orderId")]
    pub order: Uuid,
    #[serde(alias = "customerId")]
    pub customer: Uuid,
    #[serde(alias = "sellerId")]
    pub seller: Uuid,
    #[serde(default)]
    pub items: Vec<ReturnItem>,
    pub return_type: Option<ReturnType>,
    pub reason: String,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub refund_amount: Option<f64>,
    pub refund_method: Option<RefundMethod>,
    pub pickup_address: Option<ShippingAddress>,
}

async fn create_return(
    State(state): State<AppState>,
    Json(body): Json<CreateReturn>,
) -> Result<(StatusCode, Json<ReturnRequest>), ApiError> {
    let request = sqlx::query_as::<_, ReturnRequest>(
        "INSERT INTO returns (id, order_id, customer_id, seller_id, items, return_type, reason, \
           description, images, refund_amount, refund_method, pickup_address) \
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'refund'::return_type), $7, $8, $9, $10, $11, $12) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(body.order)
    .bind(body.customer)
    .bind(body.seller)
    .bind(Jsonb(body.items))
    .bind(body.return_type)
    .bind(&body.reason)
    .bind(&body.description)
    .bind(&body.images)
    .bind(body.refund_amount)
    .bind(body.refund_method)
    .bind(body.pickup_address.map(Jsonb))
    .fetch_one(&state.db)
    .await?;

    if let Some((seller_user,)) =
        sqlx::query_as::<_, (Uuid,)>("SELECT user_id FROM sellers WHERE id = $1")
            .bind(request.seller_id)
            .fetch_optional(&state.db)
            .await?
    {
        create_notification(
            &state.db,
            NewNotification {
                recipient_id: seller_user,
                recipient_role: UserRole::Seller,
                kind: NotificationKind::DisputeOpened,
                title: "New Return Request".to_string(),
                message: format!("Customer has requested a return for order #{}", request.order_id),
                link: None,
                icon: None,
                related_order: Some(request.order_id),
                related_product: None,
            },
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReturnStatus {
    pub status: ReturnStatus,
    pub admin_notes: Option<String>,
    pub approved_by: Option<Uuid>,
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReturnStatus>,
) -> Result<Json<ReturnRequest>, ApiError> {
    let request = sqlx::query_as::<_, ReturnRequest>(
        "UPDATE returns SET \
           status = $2, \
           admin_notes = COALESCE($3, admin_notes), \
           approved_by = COALESCE($4, approved_by), \
           approved_at = CASE WHEN $2 = 'approved'::return_status THEN NOW() ELSE approved_at END, \
           refunded_at = CASE WHEN $2 = 'refunded'::return_status THEN NOW() ELSE refunded_at END, \
           updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(body.status)
    .bind(&body.admin_notes)
    .bind(body.approved_by)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Return request not found".to_string()))?;

    create_notification(
        &state.db,
        NewNotification {
            recipient_id: request.customer_id,
            recipient_role: UserRole::Customer,
            kind: NotificationKind::DisputeResolved,
            title: "Return Request Updated".to_string(),
            message: format!("Your return request has been {}", request.status.as_str()),
            link: None,
            icon: None,
            related_order: Some(request.order_id),
            related_product: None,
        },
    )
    .await;

    Ok(Json(request))
}

async fn delete_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("DELETE FROM returns WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(Json(json!({ "message": "Return request deleted" })))
}
