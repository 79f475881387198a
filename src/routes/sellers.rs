//! Seller registration and the admin-only lifecycle controls.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::models::seller::{Seller, SellerStatus};
use crate::models::user::{User, UserRole, UserSummary};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_seller))
        .route("/", get(list_sellers))
        .route("/:id/approve", patch(approve_seller))
        .route("/:id/block", patch(block_seller))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSeller {
    pub user_id: Uuid,
    pub store_name: String,
    pub store_description: Option<String>,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
}

/// Creates the storefront profile and flips the linked user's role to
/// seller. One profile per user, backstopped by a unique index.
async fn register_seller(
    State(state): State<AppState>,
    Json(body): Json<RegisterSeller>,
) -> Result<(StatusCode, Json<Seller>), ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(body.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let already_registered = || ApiError::Conflict("Already registered as seller".to_string());

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM sellers WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(already_registered());
    }

    let seller = sqlx::query_as::<_, Seller>(
        "INSERT INTO sellers (id, user_id, store_name, store_description, business_email, business_phone) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user.id)
    .bind(&body.store_name)
    .bind(&body.store_description)
    .bind(&body.business_email)
    .bind(&body.business_phone)
    .fetch_one(&state.db)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => already_registered(),
        _ => ApiError::Database(err),
    })?;

    sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
        .bind(user.id)
        .bind(UserRole::Seller)
        .execute(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(seller)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerWithUser {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user: UserSummary,
    pub store_name: String,
    pub store_description: Option<String>,
    pub store_logo: Option<String>,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub status: SellerStatus,
    pub rating: f64,
    pub total_sales: i64,
    pub total_revenue: f64,
    pub commission: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SellerUserRow {
    #[sqlx(flatten)]
    seller: Seller,
    user_username: String,
    user_email: String,
}

async fn list_sellers(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<SellerWithUser>>, ApiError> {
    let rows = sqlx::query_as::<_, SellerUserRow>(
        "SELECT s.*, u.username AS user_username, u.email AS user_email \
         FROM sellers s JOIN users u ON u.id = s.user_id \
         ORDER BY s.created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    let sellers = rows
        .into_iter()
        .map(|row| {
            let s = row.seller;
            SellerWithUser {
                id: s.id,
                user: UserSummary {
                    id: s.user_id,
                    username: row.user_username,
                    email: row.user_email,
                },
                store_name: s.store_name,
                store_description: s.store_description,
                store_logo: s.store_logo,
                business_email: s.business_email,
                business_phone: s.business_phone,
                status: s.status,
                rating: s.rating,
                total_sales: s.total_sales,
                total_revenue: s.total_revenue,
                commission: s.commission,
                created_at: s.created_at,
            }
        })
        .collect();
    Ok(Json(sellers))
}

async fn set_seller_status(
    state: &AppState,
    id: Uuid,
    status: SellerStatus,
) -> Result<Json<Seller>, ApiError> {
    let seller =
        sqlx::query_as::<_, Seller>("UPDATE sellers SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Seller not found".to_string()))?;
    Ok(Json(seller))
}

async fn approve_seller(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Seller>, ApiError> {
    set_seller_status(&state, id, SellerStatus::Approved).await
}

async fn block_seller(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Seller>, ApiError> {
    set_seller_status(&state, id, SellerStatus::Blocked).await
}
