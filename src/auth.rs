//! Session tokens and request authentication.
//!
//! Sessions are a signed JWT carried in an HTTP-only `auth_token` cookie
//! with a 7-day expiry. The payload is `{id, role}`; downstream handlers
//! authorize against those claims via the [`AuthUser`] and [`AdminUser`]
//! extractors.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::user::UserRole;
use crate::AppState;

pub const COOKIE_NAME: &str = "auth_token";
const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub role: UserRole,
    pub exp: i64,
}

pub fn issue_token(secret: &str, id: Uuid, role: UserRole) -> Result<String, ApiError> {
    let claims = Claims {
        id,
        role,
        exp: (Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| ApiError::Internal(err.to_string()))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(COOKIE_NAME, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::days(TOKEN_TTL_DAYS));
    cookie
}

pub fn expired_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(COOKIE_NAME, "");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

/// Authenticated session claims, resolved from the session cookie.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match CookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(err) => match err {},
        };
        let token = jar
            .get(COOKIE_NAME)
            .ok_or_else(|| ApiError::Auth("Not authenticated".to_string()))?;
        let claims = verify_token(&state.config.jwt_secret, token.value())?;
        Ok(AuthUser(claims))
    }
}

/// Admin-gated session: 401 when unauthenticated, 403 for other roles.
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != UserRole::Admin {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret";

    #[test]
    fn token_round_trip_preserves_claims() {
        let id = Uuid::now_v7();
        let token = issue_token(SECRET, id, UserRole::Seller).unwrap();
        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.role, UserRole::Seller);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, Uuid::now_v7(), UserRole::Customer).unwrap();
        assert!(verify_token("other_secret", &token).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue_token(SECRET, Uuid::now_v7(), UserRole::Customer).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');
        assert!(verify_token(SECRET, &tampered).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            id: Uuid::now_v7(),
            role: UserRole::Customer,
            exp: (Utc::now() - chrono::Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(SECRET, &token).is_err());
    }
}
