//! Coupon eligibility and discount computation.
//!
//! Pure: the caller looks the coupon up (code, active flag, validity window)
//! and supplies current usage counters; redeeming a coupon (incrementing
//! usage_count and recording a coupon_usage row) belongs to the order
//! placement transaction.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

impl DiscountType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Percentage" => Some(Self::Percentage),
            "FixedAmount" => Some(Self::FixedAmount),
            _ => None,
        }
    }
}

/// Snapshot of a coupon row plus the requesting user's redemption count.
#[derive(Clone, Debug)]
pub struct CouponTerms {
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub min_order_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub usage_limit_per_user: Option<i32>,
    pub user_redemptions: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("invalid coupon code")]
    InvalidCoupon,
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    #[error("minimum order amount of {0} required")]
    MinOrderNotMet(Decimal),
    #[error("you have already used this coupon")]
    AlreadyUsedByUser,
}

/// Checks eligibility and returns the discount for `subtotal`.
///
/// Percentage discounts are rounded to 2dp and clamped to the cap; fixed
/// discounts are clamped to the subtotal so a total can never go negative.
pub fn evaluate(terms: &CouponTerms, subtotal: Decimal) -> Result<Decimal, CouponRejection> {
    if let Some(limit) = terms.usage_limit {
        if terms.usage_count >= limit {
            return Err(CouponRejection::UsageLimitReached);
        }
    }
    if let Some(min) = terms.min_order_amount {
        if subtotal < min {
            return Err(CouponRejection::MinOrderNotMet(min));
        }
    }
    if let Some(per_user) = terms.usage_limit_per_user {
        if terms.user_redemptions >= per_user as i64 {
            return Err(CouponRejection::AlreadyUsedByUser);
        }
    }

    let discount = match terms.discount_type {
        DiscountType::Percentage => {
            let raw = (subtotal * terms.discount_value / Decimal::from(100)).round_dp(2);
            match terms.max_discount_amount {
                Some(cap) if raw > cap => cap,
                _ => raw,
            }
        }
        DiscountType::FixedAmount => terms.discount_value.min(subtotal),
    };
    Ok(discount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percentage(value: i64) -> CouponTerms {
        CouponTerms {
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::from(value),
            max_discount_amount: None,
            min_order_amount: None,
            usage_limit: None,
            usage_count: 0,
            usage_limit_per_user: None,
            user_redemptions: 0,
        }
    }

    #[test]
    fn percentage_discount_capped() {
        // SAVE10: 10% off, min order 500, capped at 100.
        let mut terms = percentage(10);
        terms.min_order_amount = Some(Decimal::from(500));
        terms.max_discount_amount = Some(Decimal::from(100));
        assert_eq!(
            evaluate(&terms, Decimal::from(1200)),
            Ok(Decimal::from(100))
        );
        assert_eq!(evaluate(&terms, Decimal::from(800)), Ok(Decimal::from(80)));
    }

    #[test]
    fn min_order_enforced() {
        let mut terms = percentage(10);
        terms.min_order_amount = Some(Decimal::from(500));
        assert_eq!(
            evaluate(&terms, Decimal::from(300)),
            Err(CouponRejection::MinOrderNotMet(Decimal::from(500)))
        );
    }

    #[test]
    fn global_usage_limit() {
        let mut terms = percentage(10);
        terms.usage_limit = Some(5);
        terms.usage_count = 5;
        assert_eq!(
            evaluate(&terms, Decimal::from(1000)),
            Err(CouponRejection::UsageLimitReached)
        );
        terms.usage_count = 4;
        assert!(evaluate(&terms, Decimal::from(1000)).is_ok());
    }

    #[test]
    fn per_user_limit() {
        let mut terms = percentage(10);
        terms.usage_limit_per_user = Some(1);
        terms.user_redemptions = 1;
        assert_eq!(
            evaluate(&terms, Decimal::from(1000)),
            Err(CouponRejection::AlreadyUsedByUser)
        );
    }

    #[test]
    fn fixed_amount_clamped_to_subtotal() {
        let terms = CouponTerms {
            discount_type: DiscountType::FixedAmount,
            discount_value: Decimal::from(200),
            max_discount_amount: None,
            min_order_amount: None,
            usage_limit: None,
            usage_count: 0,
            usage_limit_per_user: None,
            user_redemptions: 0,
        };
        assert_eq!(evaluate(&terms, Decimal::from(150)), Ok(Decimal::from(150)));
        assert_eq!(evaluate(&terms, Decimal::from(500)), Ok(Decimal::from(200)));
    }

    #[test]
    fn rounding_to_paise() {
        // 10% of 999.95 = 99.995 → 100.00 after rounding.
        let terms = percentage(10);
        assert_eq!(
            evaluate(&terms, Decimal::new(99995, 2)),
            Ok(Decimal::new(10000, 2))
        );
    }
}
