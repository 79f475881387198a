//! Product catalog: paginated listing, cached detail, CRUD.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::product::{Product, ProductStatus, ProductSummary};
use crate::models::seller::StoreSummary;
use crate::AppState;

const LIST_CACHE: &str = "public, max-age=300";
const DETAIL_CACHE: &str = "public, max-age=600";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

pub fn total_pages(total: i64, limit: u32) -> i64 {
    if limit == 0 {
        return 0;
    }
    (total + i64::from(limit) - 1) / i64::from(limit)
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = i64::from(page - 1) * i64::from(limit);

    let data = sqlx::query_as::<_, ProductSummary>(
        "SELECT id, name, price, images, category, rating, sold, stock FROM products \
         WHERE ($1::text IS NULL OR category = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&params.category)
    .bind(i64::from(limit))
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM products WHERE ($1::text IS NULL OR category = $1)",
    )
    .bind(&params.category)
    .fetch_one(&state.db)
    .await?;

    let body = Paginated {
        data,
        pagination: Pagination {
            page,
            limit,
            total,
            pages: total_pages(total, limit),
        },
    };
    Ok(([(header::CACHE_CONTROL, LIST_CACHE)], Json(body)))
}

#[derive(Debug, Serialize)]
struct ProductDetail {
    #[serde(flatten)]
    product: Product,
    seller: Option<StoreSummary>,
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let seller = match product.seller_id {
        Some(seller_id) => {
            sqlx::query_as::<_, StoreSummary>(
                "SELECT id, store_name, rating FROM sellers WHERE id = $1",
            )
            .bind(seller_id)
            .fetch_optional(&state.db)
            .await?
        }
        None => None,
    };

    Ok((
        [(header::CACHE_CONTROL, DETAIL_CACHE)],
        Json(ProductDetail { product, seller }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    #[serde(alias = "sellerId")]
    pub seller: Option<Uuid>,
    pub status: Option<ProductStatus>,
}

async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, price, images, category, stock, seller_id, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 'approved'::product_status)) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&body.name)
    .bind(&body.description)
    .bind(body.price)
    .bind(&body.images)
    .bind(&body.category)
    .bind(body.stock.unwrap_or(100))
    .bind(body.seller)
    .bind(body.status)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    #[serde(alias = "sellerId")]
    pub seller: Option<Uuid>,
    pub status: Option<ProductStatus>,
}

/// Partial merge: absent fields keep their current values.
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProduct>,
) -> Result<Json<Product>, ApiError> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET \
           name = COALESCE($2, name), \
           description = COALESCE($3, description), \
           price = COALESCE($4, price), \
           images = COALESCE($5, images), \
           category = COALESCE($6, category), \
           stock = COALESCE($7, stock), \
           seller_id = COALESCE($8, seller_id), \
           status = COALESCE($9, status) \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&body.name)
    .bind(&body.description)
    .bind(body.price)
    .bind(&body.images)
    .bind(&body.category)
    .bind(body.stock)
    .bind(body.seller)
    .bind(body.status)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

/// Hard delete; existing orders and reviews keep their snapshots.
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(100, 20), 5);
        assert_eq!(total_pages(10, 0), 0);
    }
}
