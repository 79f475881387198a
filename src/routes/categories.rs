//! Category listing and creation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::category::Category;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_categories).post(create_category))
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(categories))
}

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
}

async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, icon, description) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&body.name)
    .bind(&body.icon)
    .bind(&body.description)
    .fetch_one(&state.db)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Category already exists".to_string())
        }
        _ => ApiError::Database(err),
    })?;
    Ok((StatusCode::CREATED, Json(category)))
}
