//! Registration, login and session endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::models::user::{User, UserRole};
use crate::AppState;

const BCRYPT_COST: u32 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionUser {
    id: Uuid,
    username: String,
    email: String,
    role: UserRole,
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<serde_json::Value>), ApiError> {
    body.validate()?;

    let role = UserRole::normalize_registration(body.role);
    let password_hash = bcrypt::hash(&body.password, BCRYPT_COST)
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, username, email, password_hash, role) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&body.username)
    .bind(&body.email)
    .bind(&password_hash)
    .bind(role)
    .fetch_one(&state.db)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Username or email already exists".to_string())
        }
        _ => ApiError::Database(err),
    })?;

    let token = auth::issue_token(&state.config.jwt_secret, user.id, user.role)?;
    Ok((
        StatusCode::CREATED,
        jar.add(auth::session_cookie(token)),
        Json(json!({
            "message": "User registered successfully",
            "user": SessionUser {
                id: user.id,
                username: user.username,
                email: user.email,
                role: user.role,
            },
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    // One generic message for unknown user and wrong password alike.
    let invalid = || ApiError::Auth("Invalid credentials".to_string());

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&body.username)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(invalid)?;

    let matches = bcrypt::verify(&body.password, &user.password_hash)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    if !matches {
        return Err(invalid());
    }

    let token = auth::issue_token(&state.config.jwt_secret, user.id, user.role)?;
    Ok((
        jar.add(auth::session_cookie(token)),
        Json(json!({
            "message": "Login successful",
            "user": SessionUser {
                id: user.id,
                username: user.username,
                email: user.email,
                role: user.role,
            },
        })),
    ))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.add(auth::expired_cookie()),
        Json(json!({ "message": "Logged out" })),
    )
}

async fn me(State(state): State<AppState>, AuthUser(claims): AuthUser) -> Result<Json<User>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_payload_is_validated() {
        let bad = RegisterRequest {
            username: "ab".into(),
            email: "not-an-email".into(),
            password: "123".into(),
            role: None,
        };
        assert!(bad.validate().is_err());

        let good = RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "hunter22".into(),
            role: Some(UserRole::Seller),
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn stored_hash_verifies_and_rejects() {
        let hash = bcrypt::hash("hunter22", BCRYPT_COST).unwrap();
        assert!(bcrypt::verify("hunter22", &hash).unwrap());
        assert!(!bcrypt::verify("wrong-password", &hash).unwrap());
    }
}
