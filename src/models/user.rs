use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Seller,
    Admin,
}

impl UserRole {
    /// Public registration may only yield customers and sellers; anything
    /// else (including an attempted `admin`) falls back to customer.
    pub fn normalize_registration(requested: Option<UserRole>) -> UserRole {
        match requested {
            Some(UserRole::Seller) => UserRole::Seller,
            _ => UserRole::Customer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub label: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub is_default: Option<bool>,
}

/// Full user row. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub addresses: Json<Vec<Address>>,
    pub wishlist: Vec<Uuid>,
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_role_is_normalized() {
        assert_eq!(
            UserRole::normalize_registration(None),
            UserRole::Customer
        );
        assert_eq!(
            UserRole::normalize_registration(Some(UserRole::Customer)),
            UserRole::Customer
        );
        assert_eq!(
            UserRole::normalize_registration(Some(UserRole::Seller)),
            UserRole::Seller
        );
        // Admins cannot be self-assigned through the public API.
        assert_eq!(
            UserRole::normalize_registration(Some(UserRole::Admin)),
            UserRole::Customer
        );
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::now_v7(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$2b$10$secret".into(),
            role: UserRole::Customer,
            phone: None,
            profile_picture: None,
            addresses: Json(vec![]),
            wishlist: vec![],
            loyalty_points: 0,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["username"], "alice");
    }
}
