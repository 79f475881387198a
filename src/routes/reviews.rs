//! Product reviews. Every mutation synchronously recomputes the product's
//! rating average and review count from all of its reviews; the recompute is
//! a single aggregate UPDATE so concurrent writes serialize at the row.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::review::Review;
use crate::models::user::UserRole;
use crate::routes::notifications::create_notification;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_review))
        .route("/product/:productId", get(list_for_product))
        .route("/user/:userId", get(list_for_user))
        .route(
            "/:id",
            axum::routing::put(update_review).delete(delete_review),
        )
}

async fn recompute_product_rating(db: &PgPool, product_id: Uuid) -> Result<(), ApiError> {
    sqlx::query(
        "UPDATE products SET \
           rating = COALESCE(agg.avg_rating, 0), \
           review_count = agg.total \
         FROM (SELECT AVG(rating)::double precision AS avg_rating, COUNT(*) AS total \
               FROM reviews WHERE product_id = $1) AS agg \
         WHERE products.id = $1",
    )
    .bind(product_id)
    .execute(db)
    .await?;
    Ok(())
}

async fn notify_seller_of_review(db: &PgPool, review: &Review) {
    // Resolve the product's seller to its user account; products without a
    // seller produce no notification.
    let seller: Option<(Uuid, String)> = sqlx::query_as(
        "SELECT s.user_id, p.name FROM products p \
         JOIN sellers s ON s.id = p.seller_id WHERE p.id = $1",
    )
    .bind(review.product_id)
    .fetch_optional(db)
    .await
    .unwrap_or_else(|err| {
        tracing::warn!(%err, "failed to resolve seller for review notification");
        None
    });

    if let Some((seller_user, product_name)) = seller {
        create_notification(
            db,
            NewNotification {
                recipient_id: seller_user,
                recipient_role: UserRole::Seller,
                kind: NotificationKind::NewReview,
                title: "New Product Review".to_string(),
                message: format!("New {}-star review for {}", review.rating, product_name),
                link: None,
                icon: None,
                related_order: None,
                related_product: Some(review.product_id),
            },
        )
        .await;
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductReviewParams {
    pub sort: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithUser {
    pub id: Uuid,
    #[serde(rename = "product")]
    pub product_id: Uuid,
    pub user: ReviewAuthor,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewUserRow {
    #[sqlx(flatten)]
    review: Review,
    user_username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviews {
    pub reviews: Vec<ReviewWithUser>,
    pub average_rating: f64,
    pub total_reviews: i64,
}

fn sort_clause(sort: Option<&str>) -> &'static str {
    match sort {
        Some("createdAt") => "r.created_at ASC",
        Some("rating") => "r.rating ASC",
        Some("-rating") => "r.rating DESC",
        _ => "r.created_at DESC",
    }
}

async fn list_for_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(params): Query<ProductReviewParams>,
) -> Result<Json<ProductReviews>, ApiError> {
    let sql = format!(
        "SELECT r.*, u.username AS user_username FROM reviews r \
         JOIN users u ON u.id = r.user_id \
         WHERE r.product_id = $1 AND ($2::int IS NULL OR r.rating = $2) \
         ORDER BY {}",
        sort_clause(params.sort.as_deref())
    );
    let rows = sqlx::query_as::<_, ReviewUserRow>(&sql)
        .bind(product_id)
        .bind(params.rating)
        .fetch_all(&state.db)
        .await?;

    let (average_rating, total_reviews): (f64, i64) = sqlx::query_as(
        "SELECT COALESCE(AVG(rating)::double precision, 0), COUNT(*) \
         FROM reviews WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_one(&state.db)
    .await?;

    let reviews = rows
        .into_iter()
        .map(|row| {
            let r = row.review;
            ReviewWithUser {
                id: r.id,
                product_id: r.product_id,
                user: ReviewAuthor {
                    id: r.user_id,
                    username: row.user_username,
                },
                rating: r.rating,
                title: r.title,
                comment: r.comment,
                created_at: r.created_at,
            }
        })
        .collect();

    Ok(Json(ProductReviews {
        reviews,
        average_rating,
        total_reviews,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReview {
    pub id: Uuid,
    pub product: Option<ReviewedProduct>,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReviewedProduct {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserReviewRow {
    #[sqlx(flatten)]
    review: Review,
    product_name: Option<String>,
    product_images: Option<Vec<String>>,
}

async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<UserReview>>, ApiError> {
    // LEFT JOIN: products are hard-deleted, reviews survive them
    let rows = sqlx::query_as::<_, UserReviewRow>(
        "SELECT r.*, p.name AS product_name, p.images AS product_images \
         FROM reviews r LEFT JOIN products p ON p.id = r.product_id \
         WHERE r.user_id = $1 ORDER BY r.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    let reviews = rows
        .into_iter()
        .map(|row| {
            let r = row.review;
            UserReview {
                id: r.id,
                product: row.product_name.map(|name| ReviewedProduct {
                    id: r.product_id,
                    name,
                    images: row.product_images.unwrap_or_default(),
                }),
                user_id: r.user_id,
                rating: r.rating,
                title: r.title,
                comment: r.comment,
                created_at: r.created_at,
            }
        })
        .collect();
    Ok(Json(reviews))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    #[serde(alias = "productId")]
    pub product: Uuid,
    #[serde(alias = "userId")]
    pub user: Uuid,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
}

async fn create_review(
    State(state): State<AppState>,
    Json(body): Json<CreateReview>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    if !(1..=5).contains(&body.rating) {
        return Err(ApiError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, product_id, user_id, rating, title, comment) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(body.product)
    .bind(body.user)
    .bind(body.rating)
    .bind(&body.title)
    .bind(&body.comment)
    .fetch_one(&state.db)
    .await?;

    recompute_product_rating(&state.db, review.product_id).await?;
    notify_seller_of_review(&state.db, &review).await;

    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateReview {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReview>,
) -> Result<Json<Review>, ApiError> {
    if let Some(rating) = body.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
    }

    let review = sqlx::query_as::<_, Review>(
        "UPDATE reviews SET \
           rating = COALESCE($2, rating), \
           title = COALESCE($3, title), \
           comment = COALESCE($4, comment) \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(body.rating)
    .bind(&body.title)
    .bind(&body.comment)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    recompute_product_rating(&state.db, review.product_id).await?;
    Ok(Json(review))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted: Option<(Uuid,)> =
        sqlx::query_as("DELETE FROM reviews WHERE id = $1 RETURNING product_id")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let (product_id,) = deleted.ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    recompute_product_rating(&state.db, product_id).await?;
    Ok(Json(json!({ "message": "Review deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parameter_maps_to_whitelisted_clauses() {
        assert_eq!(sort_clause(None), "r.created_at DESC");
        assert_eq!(sort_clause(Some("-createdAt")), "r.created_at DESC");
        assert_eq!(sort_clause(Some("createdAt")), "r.created_at ASC");
        assert_eq!(sort_clause(Some("rating")), "r.rating ASC");
        assert_eq!(sort_clause(Some("-rating")), "r.rating DESC");
        // anything unexpected falls back to newest-first
        assert_eq!(sort_clause(Some("; DROP TABLE reviews")), "r.created_at DESC");
    }

    #[test]
    fn create_payload_accepts_reference_aliases() {
        let body: CreateReview = serde_json::from_value(serde_json::json!({
            "productId": Uuid::now_v7(),
            "userId": Uuid::now_v7(),
            "rating": 4
        }))
        .unwrap();
        assert_eq!(body.rating, 4);
    }
}
