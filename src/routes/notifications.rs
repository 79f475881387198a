//! Notification feed plus the best-effort side-effect writer used by the
//! dispute, return and review handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::notification::{NewNotification, Notification};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create))
        // one path param slot serves both the per-user feed and deletion
        .route("/:id", get(list_for_user).delete(remove))
        .route("/:id/read", patch(mark_read))
        .route("/user/:userId/read-all", patch(mark_all_read))
}

/// Writes one notification row. Failures are logged and swallowed: a missed
/// notification must never fail the operation that triggered it.
pub async fn create_notification(db: &PgPool, notification: NewNotification) {
    let result = sqlx::query(
        "INSERT INTO notifications \
           (id, recipient_id, recipient_role, kind, title, message, link, icon, related_order, related_product) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(Uuid::now_v7())
    .bind(notification.recipient_id)
    .bind(notification.recipient_role)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(&notification.link)
    .bind(&notification.icon)
    .bind(notification.related_order)
    .bind(notification.related_product)
    .execute(db)
    .await;

    if let Err(err) = result {
        tracing::warn!(%err, "failed to create notification");
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<FeedParams>,
) -> Result<Json<NotificationFeed>, ApiError> {
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications \
         WHERE recipient_id = $1 AND (NOT $2 OR NOT is_read) \
         ORDER BY created_at DESC LIMIT $3",
    )
    .bind(user_id)
    .bind(params.unread_only)
    .bind(params.limit.unwrap_or(20))
    .fetch_all(&state.db)
    .await?;

    let (unread_count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(NotificationFeed {
        notifications,
        unread_count,
    }))
}

async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewNotification>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let notification = sqlx::query_as::<_, Notification>(
        "INSERT INTO notifications \
           (id, recipient_id, recipient_role, kind, title, message, link, icon, related_order, related_product) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(body.recipient_id)
    .bind(body.recipient_role)
    .bind(body.kind)
    .bind(&body.title)
    .bind(&body.message)
    .bind(&body.link)
    .bind(&body.icon)
    .bind(body.related_order)
    .bind(body.related_product)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// Idempotent: the first call stamps `read_at`, repeats return the same state.
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = sqlx::query_as::<_, Notification>(
        "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;
    Ok(Json(notification))
}

async fn mark_all_read(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query(
        "UPDATE notifications SET is_read = TRUE, read_at = NOW() \
         WHERE recipient_id = $1 AND NOT is_read",
    )
    .bind(user_id)
    .execute(&state.db)
    .await?;
    Ok(Json(json!({ "message": "All notifications marked as read" })))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(Json(json!({ "message": "Notification deleted" })))
}
