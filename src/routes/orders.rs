//! Order placement and status tracking.
//!
//! Line-item prices are taken from the client as submitted; there is no
//! stock decrement or price re-validation at placement time.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::order::{
    Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress, ShippingAddressInput,
};
use crate::models::user::UserSummary;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).patch(update_order_status))
}

/// Order with its user reference expanded to a summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithUser {
    pub id: Uuid,
    pub user: UserSummary,
    pub username: String,
    pub items: Jsonb<Vec<OrderItem>>,
    pub total: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Jsonb<ShippingAddress>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderUserRow {
    #[sqlx(flatten)]
    order: Order,
    user_username: String,
    user_email: String,
}

impl From<OrderUserRow> for OrderWithUser {
    fn from(row: OrderUserRow) -> Self {
        let order = row.order;
        OrderWithUser {
            id: order.id,
            user: UserSummary {
                id: order.user_id,
                username: row.user_username,
                email: row.user_email,
            },
            username: order.username,
            items: order.items,
            total: order.total,
            status: order.status,
            payment_status: order.payment_status,
            shipping_address: order.shipping_address,
            tracking_number: order.tracking_number,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

pub(crate) async fn fetch_orders_with_users(
    db: &PgPool,
    limit: Option<i64>,
) -> Result<Vec<OrderWithUser>, ApiError> {
    let rows = sqlx::query_as::<_, OrderUserRow>(
        "SELECT o.*, u.username AS user_username, u.email AS user_email \
         FROM orders o JOIN users u ON u.id = o.user_id \
         ORDER BY o.created_at DESC LIMIT $1",
    )
    // LIMIT NULL means no limit
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(OrderWithUser::from).collect())
}

async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderWithUser>>, ApiError> {
    Ok(Json(fetch_orders_with_users(&state.db, None).await?))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub user: Option<Uuid>,
    pub username: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: Option<f64>,
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<ShippingAddressInput>,
}

async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let user = body
        .user
        .ok_or_else(|| ApiError::Auth("Login required to place orders".to_string()))?;

    let shipping_address = body
        .shipping_address
        .map(ShippingAddressInput::normalize)
        .unwrap_or_default();

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, user_id, username, items, total, status, shipping_address) \
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'pending'::order_status), $7) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user)
    .bind(body.username.unwrap_or_else(|| "Guest".to_string()))
    .bind(Jsonb(body.items))
    .bind(body.total.unwrap_or(0.0))
    .bind(body.status)
    .bind(Jsonb(shipping_address))
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}

/// Status-only patch; transitions are not validated.
async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrderStatus>,
) -> Result<Json<Order>, ApiError> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(body.status)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_order_requires_a_user() {
        let body: CreateOrder = serde_json::from_value(serde_json::json!({
            "items": [{"productId": Uuid::now_v7(), "price": 10.0, "quantity": 2}],
            "total": 20.0
        }))
        .unwrap();
        assert!(body.user.is_none());

        let err = body
            .user
            .ok_or_else(|| ApiError::Auth("Login required to place orders".to_string()))
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn mixed_item_key_shapes_normalize() {
        let body: CreateOrder = serde_json::from_value(serde_json::json!({
            "user": Uuid::now_v7(),
            "items": [
                {"product": Uuid::now_v7(), "name": "A", "price": 1.0},
                {"productId": Uuid::now_v7(), "name": "B", "price": 2.0, "quantity": 3}
            ],
            "shippingAddress": "1 Elm St"
        }))
        .unwrap();
        assert_eq!(body.items.len(), 2);
        assert_eq!(body.items[0].quantity, 1);
        assert_eq!(body.items[1].quantity, 3);
        let addr = body.shipping_address.unwrap().normalize();
        assert_eq!(addr.address, "1 Elm St");
    }
}
