//! Payment mode and payment state machine.
//!
//! Payments start Initiated and move to Captured or Failed via the gateway
//! callback; an Authorized hold may sit in between. Captured payments are
//! immutable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Prepaid,
    #[serde(rename = "COD")]
    Cod,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prepaid => "Prepaid",
            Self::Cod => "COD",
        }
    }
}

impl FromStr for PaymentMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Prepaid" => Ok(Self::Prepaid),
            "COD" => Ok(Self::Cod),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Initiated,
    Authorized,
    Captured,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "Initiated",
            Self::Authorized => "Authorized",
            Self::Captured => "Captured",
            Self::Failed => "Failed",
        }
    }

    pub fn can_transition(&self, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, to),
            (Initiated, Authorized)
                | (Initiated, Captured)
                | (Initiated, Failed)
                | (Authorized, Captured)
                | (Authorized, Failed)
        )
    }
}

impl FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Initiated" => Ok(Self::Initiated),
            "Authorized" => Ok(Self::Authorized),
            "Captured" => Ok(Self::Captured),
            "Failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_and_failed_are_terminal() {
        for to in [
            PaymentStatus::Initiated,
            PaymentStatus::Authorized,
            PaymentStatus::Captured,
            PaymentStatus::Failed,
        ] {
            assert!(!PaymentStatus::Captured.can_transition(to));
            assert!(!PaymentStatus::Failed.can_transition(to));
        }
    }

    #[test]
    fn capture_paths() {
        assert!(PaymentStatus::Initiated.can_transition(PaymentStatus::Captured));
        assert!(PaymentStatus::Initiated.can_transition(PaymentStatus::Authorized));
        assert!(PaymentStatus::Authorized.can_transition(PaymentStatus::Captured));
        assert!(!PaymentStatus::Authorized.can_transition(PaymentStatus::Initiated));
    }

    #[test]
    fn mode_roundtrip() {
        assert_eq!("COD".parse::<PaymentMode>(), Ok(PaymentMode::Cod));
        assert_eq!(PaymentMode::Cod.as_str(), "COD");
        assert!("cod".parse::<PaymentMode>().is_err());
    }
}
