//! Checkout pricing: shipping fee, tax, and order totals.

use rust_decimal::Decimal;
use serde::Serialize;

/// Orders above this (discounted) subtotal ship free.
pub fn free_shipping_threshold() -> Decimal {
    Decimal::from(500)
}

/// Flat fee below the free-shipping threshold.
pub fn flat_shipping_fee() -> Decimal {
    Decimal::from(50)
}

/// GST applied to the discounted subtotal at checkout.
pub fn tax_rate() -> Decimal {
    // 18%
    Decimal::new(18, 2)
}

pub fn shipping_fee(discounted_subtotal: Decimal, free_delivery: bool) -> Decimal {
    if free_delivery || discounted_subtotal > free_shipping_threshold() {
        Decimal::ZERO
    } else {
        flat_shipping_fee()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// `total = subtotal - discount + shipping + 18% tax on the discounted subtotal`.
/// `free_delivery` comes from an active membership plan.
pub fn order_totals(subtotal: Decimal, discount: Decimal, free_delivery: bool) -> OrderTotals {
    let discounted = (subtotal - discount).max(Decimal::ZERO);
    let shipping = shipping_fee(discounted, free_delivery);
    let tax = (discounted * tax_rate()).round_dp(2);
    OrderTotals {
        subtotal,
        discount,
        shipping,
        tax,
        total: discounted + shipping + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipping_free_above_threshold() {
        assert_eq!(shipping_fee(Decimal::from(1200), false), Decimal::ZERO);
        assert_eq!(shipping_fee(Decimal::from(300), false), Decimal::from(50));
        // Threshold itself is not free.
        assert_eq!(shipping_fee(Decimal::from(500), false), Decimal::from(50));
    }

    #[test]
    fn membership_free_delivery_overrides_fee() {
        assert_eq!(shipping_fee(Decimal::from(300), true), Decimal::ZERO);
    }

    #[test]
    fn totals_with_discount_and_tax() {
        // 1200 - 100 = 1100; free shipping; tax 198.
        let t = order_totals(Decimal::from(1200), Decimal::from(100), false);
        assert_eq!(t.shipping, Decimal::ZERO);
        assert_eq!(t.tax, Decimal::from(198));
        assert_eq!(t.total, Decimal::from(1298));
    }

    #[test]
    fn totals_below_threshold_pay_flat_fee() {
        let t = order_totals(Decimal::from(300), Decimal::ZERO, false);
        assert_eq!(t.shipping, Decimal::from(50));
        assert_eq!(t.tax, Decimal::from(54));
        assert_eq!(t.total, Decimal::from(404));
    }

    #[test]
    fn discount_never_drives_total_negative() {
        let t = order_totals(Decimal::from(100), Decimal::from(100), true);
        assert_eq!(t.total, Decimal::ZERO);
    }
}
