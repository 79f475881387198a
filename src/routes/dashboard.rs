//! Role-specific dashboard summaries.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::order::Order;
use crate::models::seller::Seller;
use crate::models::user::User;
use crate::routes::orders::fetch_orders_with_users;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/seller/dashboard/:userId", get(seller_dashboard))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/customer/dashboard/:userId", get(customer_dashboard))
}

async fn seller_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let seller = sqlx::query_as::<_, Seller>("SELECT * FROM sellers WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Seller not found".to_string()))?;

    let (total_products,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE seller_id = $1")
            .bind(seller.id)
            .fetch_one(&state.db)
            .await?;

    let (total_orders,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders o \
         WHERE EXISTS (SELECT 1 FROM jsonb_array_elements(o.items) AS item \
                       WHERE (item->>'seller')::uuid = $1)",
    )
    .bind(seller.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({
        "totalSales": seller.total_sales,
        "totalRevenue": seller.total_revenue,
        "totalProducts": total_products,
        "totalOrders": total_orders,
        "rating": seller.rating,
        "status": seller.status,
        "storeInfo": {
            "name": seller.store_name,
            "description": seller.store_description,
            "logo": seller.store_logo,
        },
    })))
}

async fn admin_dashboard(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (total_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;
    let (total_customers,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'customer'")
            .fetch_one(&state.db)
            .await?;
    let (total_sellers,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sellers")
        .fetch_one(&state.db)
        .await?;
    let (total_products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&state.db)
        .await?;
    let (total_orders, total_revenue): (i64, f64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total), 0)::double precision FROM orders")
            .fetch_one(&state.db)
            .await?;

    let recent_orders = fetch_orders_with_users(&state.db, Some(10)).await?;

    Ok(Json(json!({
        "totalUsers": total_users,
        "totalCustomers": total_customers,
        "totalSellers": total_sellers,
        "totalProducts": total_products,
        "totalOrders": total_orders,
        "totalRevenue": total_revenue,
        "recentOrders": recent_orders,
    })))
}

async fn customer_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let (total_orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.db)
        .await?;

    let recent_orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT 10",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "totalOrders": total_orders,
        "loyaltyPoints": user.loyalty_points,
        "wishlistCount": user.wishlist.len(),
        "addressCount": user.addresses.0.len(),
        "recentOrders": recent_orders,
    })))
}
