use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "discount_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Discount coupon. Validation (eligibility + discount computation) is
/// read-only; recording usage happens separately through `apply`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_purchase: f64,
    pub max_discount: Option<f64>,
    /// None means unlimited.
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub applicable_products: Vec<Uuid>,
    pub applicable_categories: Vec<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Discount owed for a cart total, assuming eligibility checks passed.
    /// Percentage discounts clamp to `max_discount` when one is set.
    pub fn discount_for(&self, cart_total: f64) -> f64 {
        match self.discount_type {
            DiscountType::Percentage => {
                let discount = cart_total * self.discount_value / 100.0;
                match self.max_discount {
                    Some(max) if discount > max => max,
                    _ => discount,
                }
            }
            DiscountType::Fixed => self.discount_value,
        }
    }

    pub fn usage_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if self.used_count >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(discount_type: DiscountType, value: f64, max: Option<f64>) -> Coupon {
        Coupon {
            id: Uuid::now_v7(),
            code: "SAVE20".into(),
            description: None,
            discount_type,
            discount_value: value,
            min_purchase: 0.0,
            max_discount: max,
            usage_limit: None,
            used_count: 0,
            valid_from: Utc::now(),
            valid_until: Utc::now() + chrono::Duration::days(30),
            is_active: true,
            applicable_products: vec![],
            applicable_categories: vec![],
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_discount_clamps_to_max() {
        // 20% of 200 is 40, clamped to the 30 cap.
        let c = coupon(DiscountType::Percentage, 20.0, Some(30.0));
        let discount = c.discount_for(200.0);
        assert_eq!(discount, 30.0);
        assert_eq!(200.0 - discount, 170.0);
    }

    #[test]
    fn percentage_discount_below_cap_is_untouched() {
        let c = coupon(DiscountType::Percentage, 10.0, Some(30.0));
        assert_eq!(c.discount_for(200.0), 20.0);
    }

    #[test]
    fn percentage_discount_without_cap() {
        let c = coupon(DiscountType::Percentage, 20.0, None);
        assert_eq!(c.discount_for(200.0), 40.0);
    }

    #[test]
    fn fixed_discount_ignores_cart_total() {
        let c = coupon(DiscountType::Fixed, 15.0, None);
        assert_eq!(c.discount_for(200.0), 15.0);
        assert_eq!(c.discount_for(20.0), 15.0);
    }

    #[test]
    fn usage_limit_checks() {
        let mut c = coupon(DiscountType::Fixed, 5.0, None);
        assert!(!c.usage_exhausted());

        c.usage_limit = Some(10);
        c.used_count = 9;
        assert!(!c.usage_exhausted());

        c.used_count = 10;
        assert!(c.usage_exhausted());
    }
}
