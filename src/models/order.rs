use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Canonical order line item. Incoming carts may name the product reference
/// either `product` or `productId`; the alias accepts both and the canonical
/// shape keeps a single reference (compatibility shim for older clients).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "productId")]
    pub product: Uuid,
    pub seller: Option<Uuid>,
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

/// Checkout forms may submit the shipping address as a bare string or as the
/// structured object; both normalize to [`ShippingAddress`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShippingAddressInput {
    Text(String),
    Structured(ShippingAddress),
}

impl ShippingAddressInput {
    pub fn normalize(self) -> ShippingAddress {
        match self {
            ShippingAddressInput::Text(address) => ShippingAddress {
                address,
                ..ShippingAddress::default()
            },
            ShippingAddressInput::Structured(addr) => addr,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub username: String,
    pub items: Json<Vec<OrderItem>>,
    pub total: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Json<ShippingAddress>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_accepts_either_product_key() {
        let a: OrderItem =
            serde_json::from_str(r#"{"product":"0188e926-4a56-7bbb-8000-000000000001"}"#).unwrap();
        let b: OrderItem =
            serde_json::from_str(r#"{"productId":"0188e926-4a56-7bbb-8000-000000000001"}"#)
                .unwrap();
        assert_eq!(a.product, b.product);
        assert_eq!(a.quantity, 1);
    }

    #[test]
    fn item_quantity_defaults_to_one() {
        let item: OrderItem = serde_json::from_value(serde_json::json!({
            "productId": Uuid::now_v7(),
            "name": "Widget",
            "price": 9.99
        }))
        .unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price, Some(9.99));
    }

    #[test]
    fn shipping_address_accepts_string_or_object() {
        let text: ShippingAddressInput = serde_json::from_str(r#""12 Main St""#).unwrap();
        let addr = text.normalize();
        assert_eq!(addr.address, "12 Main St");
        assert_eq!(addr.city, "");

        let structured: ShippingAddressInput = serde_json::from_str(
            r#"{"address":"12 Main St","city":"Springfield","state":"IL","zipCode":"62701"}"#,
        )
        .unwrap();
        let addr = structured.normalize();
        assert_eq!(addr.city, "Springfield");
        assert_eq!(addr.zip_code, "62701");
    }
}
