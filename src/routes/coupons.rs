//! Coupon management and the two-phase discount workflow: `validate` is a
//! read-only eligibility check, `apply` records usage separately.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::coupon::{Coupon, DiscountType};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/:id", axum::routing::put(update_coupon).delete(delete_coupon))
        .route("/validate", post(validate_coupon))
        .route("/apply", post(apply_coupon))
}

async fn list_coupons(State(state): State<AppState>) -> Result<Json<Vec<Coupon>>, ApiError> {
    let coupons = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(coupons))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCoupon {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: f64,
    pub min_purchase: Option<f64>,
    pub max_discount: Option<f64>,
    pub usage_limit: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub applicable_products: Vec<Uuid>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    pub created_by: Option<Uuid>,
}

async fn create_coupon(
    State(state): State<AppState>,
    Json(body): Json<CreateCoupon>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    let coupon = sqlx::query_as::<_, Coupon>(
        "INSERT INTO coupons (id, code, description, discount_type, discount_value, min_purchase, \
           max_discount, usage_limit, valid_from, valid_until, is_active, applicable_products, \
           applicable_categories, created_by) \
         VALUES ($1, UPPER($2), $3, COALESCE($4, 'percentage'::discount_type), $5, \
           COALESCE($6, 0), $7, $8, COALESCE($9, NOW()), $10, COALESCE($11, TRUE), $12, $13, $14) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&body.code)
    .bind(&body.description)
    .bind(body.discount_type)
    .bind(body.discount_value)
    .bind(body.min_purchase)
    .bind(body.max_discount)
    .bind(body.usage_limit)
    .bind(body.valid_from)
    .bind(body.valid_until)
    .bind(body.is_active)
    .bind(&body.applicable_products)
    .bind(&body.applicable_categories)
    .bind(body.created_by)
    .fetch_one(&state.db)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Coupon code already exists".to_string())
        }
        _ => ApiError::Database(err),
    })?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoupon {
    pub code: Option<String>,
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<f64>,
    pub min_purchase: Option<f64>,
    pub max_discount: Option<f64>,
    pub usage_limit: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCoupon>,
) -> Result<Json<Coupon>, ApiError> {
    let coupon = sqlx::query_as::<_, Coupon>(
        "UPDATE coupons SET \
           code = COALESCE(UPPER($2), code), \
           description = COALESCE($3, description), \
           discount_type = COALESCE($4, discount_type), \
           discount_value = COALESCE($5, discount_value), \
           min_purchase = COALESCE($6, min_purchase), \
           max_discount = COALESCE($7, max_discount), \
           usage_limit = COALESCE($8, usage_limit), \
           valid_from = COALESCE($9, valid_from), \
           valid_until = COALESCE($10, valid_until), \
           is_active = COALESCE($11, is_active) \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&body.code)
    .bind(&body.description)
    .bind(body.discount_type)
    .bind(body.discount_value)
    .bind(body.min_purchase)
    .bind(body.max_discount)
    .bind(body.usage_limit)
    .bind(body.valid_from)
    .bind(body.valid_until)
    .bind(body.is_active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Coupon not found".to_string()))?;
    Ok(Json(coupon))
}

async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(Json(json!({ "message": "Coupon deleted successfully" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCoupon {
    pub code: String,
    pub cart_total: f64,
    #[serde(default)]
    #[allow(dead_code)]
    pub products: Vec<Uuid>,
}

/// Read-only eligibility check; does not touch the usage counter.
async fn validate_coupon(
    State(state): State<AppState>,
    Json(body): Json<ValidateCoupon>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let coupon = sqlx::query_as::<_, Coupon>(
        "SELECT * FROM coupons WHERE code = UPPER($1) AND is_active \
         AND valid_from <= NOW() AND valid_until >= NOW()",
    )
    .bind(&body.code)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Invalid or expired coupon code".to_string()))?;

    if coupon.usage_exhausted() {
        return Err(ApiError::Validation("Coupon usage limit reached".to_string()));
    }
    if body.cart_total < coupon.min_purchase {
        return Err(ApiError::Validation(format!(
            "Minimum purchase of ${} required",
            coupon.min_purchase
        )));
    }

    let discount = coupon.discount_for(body.cart_total);
    Ok(Json(json!({
        "valid": true,
        "coupon": {
            "code": coupon.code,
            "description": coupon.description,
            "discountType": coupon.discount_type,
            "discountValue": coupon.discount_value,
        },
        "discount": discount,
        "finalTotal": body.cart_total - discount,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCoupon {
    pub coupon_id: Uuid,
}

/// Records one use. The increment is conditional on the usage limit, so
/// concurrent applications cannot push `used_count` past it; a missing or
/// exhausted coupon is not an error for the caller.
async fn apply_coupon(
    State(state): State<AppState>,
    Json(body): Json<ApplyCoupon>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query(
        "UPDATE coupons SET used_count = used_count + 1 \
         WHERE id = $1 AND (usage_limit IS NULL OR used_count < usage_limit)",
    )
    .bind(body.coupon_id)
    .execute(&state.db)
    .await?;
    Ok(Json(json!({ "message": "Coupon applied successfully" })))
}
