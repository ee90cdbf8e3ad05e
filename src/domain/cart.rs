//! Cart line arithmetic.
//!
//! A line's unit price is locked at the moment it was added (or last
//! re-added); catalog price changes never retroactively reprice a line.

use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub struct CartLine {
    pub quantity: i32,
    pub price_at_addition: Decimal,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.price_at_addition * Decimal::from(self.quantity)
    }
}

pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().fold(Decimal::ZERO, |acc, l| acc + l.line_total())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_uses_locked_price() {
        let line = CartLine {
            quantity: 2,
            price_at_addition: Decimal::new(49950, 2),
        };
        assert_eq!(line.line_total(), Decimal::new(99900, 2));
    }

    #[test]
    fn subtotal_folds_lines() {
        let lines = vec![
            CartLine { quantity: 2, price_at_addition: Decimal::from(100) },
            CartLine { quantity: 1, price_at_addition: Decimal::from(250) },
        ];
        assert_eq!(subtotal(&lines), Decimal::from(450));
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }
}
