//! Platform, seller and customer analytics, computed as GROUP BY queries
//! over the orders table and its JSONB line items.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::product::Product;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_analytics))
        .route("/seller/:sellerId", get(seller_analytics))
        .route("/customer/:customerId", get(customer_analytics))
}

#[derive(Debug, Deserialize)]
pub struct PeriodParams {
    /// Window in days.
    pub period: Option<i64>,
}

fn window_start(params: &PeriodParams) -> DateTime<Utc> {
    Utc::now() - Duration::days(params.period.unwrap_or(30))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DailyRevenue {
    pub day: String,
    pub revenue: f64,
    pub orders: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub total_sold: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopSeller {
    pub id: Uuid,
    pub store_name: String,
    pub username: String,
    pub total_revenue: f64,
    pub total_sales: i64,
    pub rating: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CategoryStat {
    pub category: Option<String>,
    pub count: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DailyCount {
    pub day: String,
    pub count: i64,
}

async fn admin_analytics(
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let start = window_start(&params);

    let revenue_by_day = sqlx::query_as::<_, DailyRevenue>(
        "SELECT to_char(created_at, 'YYYY-MM-DD') AS day, \
                COALESCE(SUM(total), 0)::double precision AS revenue, \
                COUNT(*) AS orders \
         FROM orders WHERE created_at >= $1 AND status = 'delivered' \
         GROUP BY day ORDER BY day",
    )
    .bind(start)
    .fetch_all(&state.db)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        "SELECT p.id AS product_id, p.name, \
                SUM((item->>'quantity')::bigint)::bigint AS total_sold, \
                SUM(COALESCE((item->>'price')::double precision, 0) \
                    * (item->>'quantity')::bigint) AS revenue \
         FROM orders o \
         CROSS JOIN LATERAL jsonb_array_elements(o.items) AS item \
         JOIN products p ON p.id = (item->>'product')::uuid \
         WHERE o.created_at >= $1 \
         GROUP BY p.id, p.name ORDER BY total_sold DESC LIMIT 10",
    )
    .bind(start)
    .fetch_all(&state.db)
    .await?;

    let top_sellers = sqlx::query_as::<_, TopSeller>(
        "SELECT s.id, s.store_name, u.username, s.total_revenue, s.total_sales, s.rating \
         FROM sellers s JOIN users u ON u.id = s.user_id \
         ORDER BY s.total_revenue DESC LIMIT 10",
    )
    .fetch_all(&state.db)
    .await?;

    let category_stats = sqlx::query_as::<_, CategoryStat>(
        "SELECT p.category, COUNT(*) AS count, \
                SUM(COALESCE((item->>'price')::double precision, 0) \
                    * (item->>'quantity')::bigint) AS revenue \
         FROM orders o \
         CROSS JOIN LATERAL jsonb_array_elements(o.items) AS item \
         JOIN products p ON p.id = (item->>'product')::uuid \
         WHERE o.created_at >= $1 \
         GROUP BY p.category ORDER BY revenue DESC",
    )
    .bind(start)
    .fetch_all(&state.db)
    .await?;

    let user_growth = sqlx::query_as::<_, DailyCount>(
        "SELECT to_char(created_at, 'YYYY-MM-DD') AS day, COUNT(*) AS count \
         FROM users WHERE created_at >= $1 GROUP BY day ORDER BY day",
    )
    .bind(start)
    .fetch_all(&state.db)
    .await?;

    let (total_revenue,): (f64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::double precision FROM orders WHERE status = 'delivered'",
    )
    .fetch_one(&state.db)
    .await?;
    let (total_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;
    let (total_sellers,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sellers WHERE status = 'approved'")
            .fetch_one(&state.db)
            .await?;
    let (total_products,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE status = 'approved'")
            .fetch_one(&state.db)
            .await?;
    let (total_orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(json!({
        "overview": {
            "totalRevenue": total_revenue,
            "totalUsers": total_users,
            "totalSellers": total_sellers,
            "totalProducts": total_products,
            "totalOrders": total_orders,
        },
        "revenueByDay": revenue_by_day,
        "topProducts": top_products,
        "topSellers": top_sellers,
        "categoryStats": category_stats,
        "userGrowth": user_growth,
    })))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

async fn seller_analytics(
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let start = window_start(&params);

    let seller: Option<(String, f64, i64, f64)> = sqlx::query_as(
        "SELECT store_name, total_revenue, total_sales, rating FROM sellers WHERE id = $1",
    )
    .bind(seller_id)
    .fetch_optional(&state.db)
    .await?;
    let (store_name, total_revenue, total_sales, rating) =
        seller.ok_or_else(|| ApiError::NotFound("Seller not found".to_string()))?;

    let revenue_by_day = sqlx::query_as::<_, DailyRevenue>(
        "SELECT to_char(o.created_at, 'YYYY-MM-DD') AS day, \
                SUM(COALESCE((item->>'price')::double precision, 0) \
                    * (item->>'quantity')::bigint) AS revenue, \
                COUNT(DISTINCT o.id) AS orders \
         FROM orders o \
         CROSS JOIN LATERAL jsonb_array_elements(o.items) AS item \
         WHERE o.created_at >= $1 AND (item->>'seller')::uuid = $2 \
         GROUP BY day ORDER BY day",
    )
    .bind(start)
    .bind(seller_id)
    .fetch_all(&state.db)
    .await?;

    let best_products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE seller_id = $1 ORDER BY sold DESC LIMIT 10",
    )
    .bind(seller_id)
    .fetch_all(&state.db)
    .await?;

    let orders_by_status = sqlx::query_as::<_, StatusCount>(
        "SELECT o.status::text AS status, COUNT(*) AS count \
         FROM orders o \
         WHERE EXISTS (SELECT 1 FROM jsonb_array_elements(o.items) AS item \
                       WHERE (item->>'seller')::uuid = $1) \
         GROUP BY o.status",
    )
    .bind(seller_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "seller": {
            "name": store_name,
            "totalRevenue": total_revenue,
            "totalSales": total_sales,
            "rating": rating,
        },
        "revenueByDay": revenue_by_day,
        "bestProducts": best_products,
        "ordersByStatus": orders_by_status,
    })))
}

async fn customer_analytics(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (total_spent, total_orders): (f64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::double precision, COUNT(*) \
         FROM orders WHERE user_id = $1",
    )
    .bind(customer_id)
    .fetch_one(&state.db)
    .await?;

    let avg_order_value = if total_orders > 0 {
        total_spent / total_orders as f64
    } else {
        0.0
    };

    let category_preferences = sqlx::query_as::<_, DailyCount>(
        "SELECT COALESCE(p.category, 'uncategorized') AS day, COUNT(*) AS count \
         FROM orders o \
         CROSS JOIN LATERAL jsonb_array_elements(o.items) AS item \
         JOIN products p ON p.id = (item->>'product')::uuid \
         WHERE o.user_id = $1 \
         GROUP BY p.category ORDER BY count DESC",
    )
    .bind(customer_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "totalSpent": total_spent,
        "totalOrders": total_orders,
        "avgOrderValue": avg_order_value,
        "categoryPreferences": category_preferences
            .into_iter()
            .map(|c| json!({ "category": c.day, "count": c.count }))
            .collect::<Vec<_>>(),
    })))
}
