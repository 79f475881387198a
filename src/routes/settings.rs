//! Site settings: a key-value configuration store with a fixed default
//! seed set. Values are tagged by type (string/number/boolean/object/array).

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::site_setting::{
    default_settings, SettingCategory, SettingType, SiteSetting,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_settings))
        .route("/bulk", post(bulk_update))
        .route("/init", post(init_defaults))
        .route("/:key", get(get_setting).put(put_setting))
}

#[derive(Debug, Deserialize)]
pub struct SettingsFilter {
    pub category: Option<SettingCategory>,
}

/// Flat `{key: value}` object, optionally filtered by category.
async fn list_settings(
    State(state): State<AppState>,
    Query(filter): Query<SettingsFilter>,
) -> Result<Json<Value>, ApiError> {
    let settings = sqlx::query_as::<_, SiteSetting>(
        "SELECT * FROM site_settings WHERE ($1::setting_category IS NULL OR category = $1)",
    )
    .bind(filter.category)
    .fetch_all(&state.db)
    .await?;

    let mut map = Map::new();
    for setting in settings {
        map.insert(setting.key, setting.value.0);
    }
    Ok(Json(Value::Object(map)))
}

async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let setting = sqlx::query_as::<_, SiteSetting>("SELECT * FROM site_settings WHERE key = $1")
        .bind(&key)
        .fetch_optional(&state.db)
        .await?;
    Ok(Json(setting.map(|s| s.value.0).unwrap_or(Value::Null)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutSetting {
    pub value: Value,
    #[serde(rename = "type")]
    pub value_type: Option<SettingType>,
    pub updated_by: Option<Uuid>,
}

async fn upsert_setting(
    state: &AppState,
    key: &str,
    value: Value,
    value_type: SettingType,
    updated_by: Option<Uuid>,
) -> Result<SiteSetting, ApiError> {
    let setting = sqlx::query_as::<_, SiteSetting>(
        "INSERT INTO site_settings (id, key, value, value_type, updated_by) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (key) DO UPDATE SET \
           value = EXCLUDED.value, \
           value_type = EXCLUDED.value_type, \
           updated_by = EXCLUDED.updated_by, \
           updated_at = NOW() \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(key)
    .bind(Jsonb(value))
    .bind(value_type)
    .bind(updated_by)
    .fetch_one(&state.db)
    .await?;
    Ok(setting)
}

async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<PutSetting>,
) -> Result<Json<SiteSetting>, ApiError> {
    let value_type = body
        .value_type
        .unwrap_or_else(|| SettingType::infer(&body.value));
    let setting = upsert_setting(&state, &key, body.value, value_type, body.updated_by).await?;
    Ok(Json(setting))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdate {
    pub settings: Map<String, Value>,
    pub updated_by: Option<Uuid>,
}

async fn bulk_update(
    State(state): State<AppState>,
    Json(body): Json<BulkUpdate>,
) -> Result<Json<Value>, ApiError> {
    for (key, value) in body.settings {
        let value_type = SettingType::infer(&value);
        upsert_setting(&state, &key, value, value_type, body.updated_by).await?;
    }
    Ok(Json(json!({ "message": "Settings updated successfully" })))
}

/// Seeds the default settings, overwriting existing values for those keys.
async fn init_defaults(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    for default in default_settings() {
        sqlx::query(
            "INSERT INTO site_settings (id, key, value, value_type, category, description) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (key) DO UPDATE SET \
               value = EXCLUDED.value, \
               value_type = EXCLUDED.value_type, \
               category = EXCLUDED.category, \
               description = EXCLUDED.description, \
               updated_at = NOW()",
        )
        .bind(Uuid::now_v7())
        .bind(default.key)
        .bind(Jsonb(default.value))
        .bind(default.value_type)
        .bind(default.category)
        .bind(default.description)
        .execute(&state.db)
        .await?;
    }
    Ok(Json(json!({ "message": "Default settings initialized" })))
}
