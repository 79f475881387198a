use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "setting_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl SettingType {
    /// Tag for an untyped JSON value, used when an upsert omits the type.
    pub fn infer(value: &Value) -> SettingType {
        match value {
            Value::Number(_) => SettingType::Number,
            Value::Bool(_) => SettingType::Boolean,
            Value::Object(_) => SettingType::Object,
            Value::Array(_) => SettingType::Array,
            _ => SettingType::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "setting_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SettingCategory {
    General,
    Payment,
    Shipping,
    Email,
    Commission,
    Security,
    Appearance,
}

/// Setting value as a tagged variant keyed by the stored type.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Object(serde_json::Map<String, Value>),
    Array(Vec<Value>),
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SiteSetting {
    pub id: Uuid,
    pub key: String,
    pub value: Json<Value>,
    #[serde(rename = "type")]
    pub value_type: SettingType,
    pub category: SettingCategory,
    pub description: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl SiteSetting {
    /// Interprets the raw JSON value under its stored type tag; a mismatch
    /// is an error rather than a silent coercion.
    pub fn typed_value(&self) -> Result<SettingValue, String> {
        let value = &self.value.0;
        match (self.value_type, value) {
            (SettingType::String, Value::String(s)) => Ok(SettingValue::String(s.clone())),
            (SettingType::Number, Value::Number(n)) => n
                .as_f64()
                .map(SettingValue::Number)
                .ok_or_else(|| format!("setting {} holds a non-finite number", self.key)),
            (SettingType::Boolean, Value::Bool(b)) => Ok(SettingValue::Boolean(*b)),
            (SettingType::Object, Value::Object(map)) => Ok(SettingValue::Object(map.clone())),
            (SettingType::Array, Value::Array(items)) => Ok(SettingValue::Array(items.clone())),
            (expected, actual) => Err(format!(
                "setting {} tagged {:?} holds incompatible value {}",
                self.key, expected, actual
            )),
        }
    }
}

pub struct DefaultSetting {
    pub key: &'static str,
    pub value: Value,
    pub value_type: SettingType,
    pub category: SettingCategory,
    pub description: &'static str,
}

/// Fixed seed set applied by `POST /api/settings/init`.
pub fn default_settings() -> Vec<DefaultSetting> {
    use serde_json::json;
    vec![
        DefaultSetting {
            key: "site_name",
            value: json!("ShopHub"),
            value_type: SettingType::String,
            category: SettingCategory::General,
            description: "Website name",
        },
        DefaultSetting {
            key: "site_email",
            value: json!("support@shophub.com"),
            value_type: SettingType::String,
            category: SettingCategory::General,
            description: "Contact email",
        },
        DefaultSetting {
            key: "commission_rate",
            value: json!(10),
            value_type: SettingType::Number,
            category: SettingCategory::Commission,
            description: "Platform commission %",
        },
        DefaultSetting {
            key: "shipping_fee",
            value: json!(5.99),
            value_type: SettingType::Number,
            category: SettingCategory::Shipping,
            description: "Standard shipping fee",
        },
        DefaultSetting {
            key: "free_shipping_threshold",
            value: json!(50),
            value_type: SettingType::Number,
            category: SettingCategory::Shipping,
            description: "Free shipping above this amount",
        },
        DefaultSetting {
            key: "tax_rate",
            value: json!(8.5),
            value_type: SettingType::Number,
            category: SettingCategory::Payment,
            description: "Tax rate %",
        },
        DefaultSetting {
            key: "currency",
            value: json!("USD"),
            value_type: SettingType::String,
            category: SettingCategory::Payment,
            description: "Currency code",
        },
        DefaultSetting {
            key: "items_per_page",
            value: json!(12),
            value_type: SettingType::Number,
            category: SettingCategory::General,
            description: "Products per page",
        },
        DefaultSetting {
            key: "allow_guest_checkout",
            value: json!(true),
            value_type: SettingType::Boolean,
            category: SettingCategory::General,
            description: "Allow checkout without account",
        },
        DefaultSetting {
            key: "maintenance_mode",
            value: json!(false),
            value_type: SettingType::Boolean,
            category: SettingCategory::General,
            description: "Enable maintenance mode",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setting(value: Value, value_type: SettingType) -> SiteSetting {
        SiteSetting {
            id: Uuid::now_v7(),
            key: "k".into(),
            value: Json(value),
            value_type,
            category: SettingCategory::General,
            description: None,
            updated_by: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn typed_value_accepts_matching_tag() {
        assert_eq!(
            setting(json!("ShopHub"), SettingType::String).typed_value(),
            Ok(SettingValue::String("ShopHub".into()))
        );
        assert_eq!(
            setting(json!(8.5), SettingType::Number).typed_value(),
            Ok(SettingValue::Number(8.5))
        );
        assert_eq!(
            setting(json!(true), SettingType::Boolean).typed_value(),
            Ok(SettingValue::Boolean(true))
        );
    }

    #[test]
    fn typed_value_rejects_mismatched_tag() {
        assert!(setting(json!("not a number"), SettingType::Number)
            .typed_value()
            .is_err());
        assert!(setting(json!(1), SettingType::Boolean).typed_value().is_err());
    }

    #[test]
    fn type_inference_covers_every_shape() {
        assert_eq!(SettingType::infer(&json!("x")), SettingType::String);
        assert_eq!(SettingType::infer(&json!(1.5)), SettingType::Number);
        assert_eq!(SettingType::infer(&json!(false)), SettingType::Boolean);
        assert_eq!(SettingType::infer(&json!({"a": 1})), SettingType::Object);
        assert_eq!(SettingType::infer(&json!([1, 2])), SettingType::Array);
        assert_eq!(SettingType::infer(&Value::Null), SettingType::String);
    }

    #[test]
    fn default_seed_set_is_stable() {
        let defaults = default_settings();
        assert_eq!(defaults.len(), 10);
        let site_name = defaults.iter().find(|s| s.key == "site_name").unwrap();
        assert_eq!(site_name.value, json!("ShopHub"));
        assert!(defaults
            .iter()
            .all(|s| SettingType::infer(&s.value) == s.value_type));
    }
}
