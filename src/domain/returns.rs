//! Return request statuses.
//!
//! Unlike order statuses, return transitions are deliberately permissive:
//! an admin may set any recognized status directly. Only unknown strings
//! are rejected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnStatus {
    #[default]
    Requested,
    Approved,
    Rejected,
    PickupScheduled,
    Completed,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::PickupScheduled => "PickupScheduled",
            Self::Completed => "Completed",
        }
    }
}

impl FromStr for ReturnStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Requested" => Ok(Self::Requested),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            "PickupScheduled" => Ok(Self::PickupScheduled),
            "Completed" => Ok(Self::Completed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refund for returning the whole line: unit price times ordered quantity.
pub fn refund_amount(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_statuses() {
        assert_eq!(
            "PickupScheduled".parse::<ReturnStatus>(),
            Ok(ReturnStatus::PickupScheduled)
        );
        assert!("Shipped".parse::<ReturnStatus>().is_err());
    }

    #[test]
    fn refund_is_price_times_quantity() {
        assert_eq!(
            refund_amount(Decimal::new(29999, 2), 2),
            Decimal::new(59998, 2)
        );
    }
}
