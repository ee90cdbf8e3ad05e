//! Membership statuses and billing cycle terms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipStatus {
    #[default]
    Active,
    Expired,
    Cancelled,
    Suspended,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
            Self::Suspended => "Suspended",
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Expired" => Ok(Self::Expired),
            "Cancelled" => Ok(Self::Cancelled),
            "Suspended" => Ok(Self::Suspended),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn duration_days(&self) -> i64 {
        match self {
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }

    /// Price charged for this cycle given the plan's monthly and annual prices.
    pub fn amount(&self, monthly_price: Decimal, annual_price: Decimal) -> Decimal {
        match self {
            Self::Monthly => monthly_price,
            Self::Yearly => annual_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_cycle_terms() {
        assert_eq!(BillingCycle::Monthly.duration_days(), 30);
        assert_eq!(BillingCycle::Yearly.duration_days(), 365);
        let monthly = Decimal::from(199);
        let annual = Decimal::from(1999);
        assert_eq!(BillingCycle::Monthly.amount(monthly, annual), monthly);
        assert_eq!(BillingCycle::Yearly.amount(monthly, annual), annual);
    }

    #[test]
    fn status_parse() {
        assert_eq!(
            "Suspended".parse::<MembershipStatus>(),
            Ok(MembershipStatus::Suspended)
        );
        assert!("Paused".parse::<MembershipStatus>().is_err());
    }
}
