//! Per-user wishlist, stored as a UUID array on the user row.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::product::Product;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:userId", get(get_wishlist))
        .route("/:userId/add", post(add_to_wishlist))
        .route("/:userId/remove/:productId", delete(remove_from_wishlist))
        .route("/:userId/clear", delete(clear_wishlist))
        .route("/:userId/check/:productId", get(check_wishlist))
        .route("/:userId/count", get(wishlist_count))
}

async fn load_wishlist_ids(db: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
    let row: Option<(Vec<Uuid>,)> = sqlx::query_as("SELECT wishlist FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    row.map(|(wishlist,)| wishlist)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Expands wishlist ids to products, preserving insertion order.
async fn populate(db: &PgPool, ids: &[Uuid]) -> Result<Vec<Product>, ApiError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = ANY($1) ORDER BY array_position($1, id)",
    )
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(products)
}

async fn get_wishlist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let ids = load_wishlist_ids(&state.db, user_id).await?;
    Ok(Json(populate(&state.db, &ids).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlist {
    pub product_id: Uuid,
}

async fn add_to_wishlist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AddToWishlist>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let ids = load_wishlist_ids(&state.db, user_id).await?;
    if ids.contains(&body.product_id) {
        return Err(ApiError::Validation(
            "Product already in wishlist".to_string(),
        ));
    }

    let (ids,): (Vec<Uuid>,) = sqlx::query_as(
        "UPDATE users SET wishlist = array_append(wishlist, $2) WHERE id = $1 RETURNING wishlist",
    )
    .bind(user_id)
    .bind(body.product_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(populate(&state.db, &ids).await?))
}

async fn remove_from_wishlist(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let row: Option<(Vec<Uuid>,)> = sqlx::query_as(
        "UPDATE users SET wishlist = array_remove(wishlist, $2) WHERE id = $1 RETURNING wishlist",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_optional(&state.db)
    .await?;
    let (ids,) = row.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(populate(&state.db, &ids).await?))
}

async fn clear_wishlist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("UPDATE users SET wishlist = '{}' WHERE id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await?;
    Ok(Json(json!({ "message": "Wishlist cleared" })))
}

async fn check_wishlist(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ids = load_wishlist_ids(&state.db, user_id).await?;
    Ok(Json(json!({ "isInWishlist": ids.contains(&product_id) })))
}

async fn wishlist_count(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ids = load_wishlist_ids(&state.db, user_id).await?;
    Ok(Json(json!({ "count": ids.len() })))
}
