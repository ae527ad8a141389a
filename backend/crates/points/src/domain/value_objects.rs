//! Domain Value Objects
//!
//! Immutable value types for the points ledger.

use rust_decimal::Decimal;
use std::fmt;

use crate::error::{PointsError, PointsResult};

/// Lifecycle of a room promotion.
///
/// Stored as text. The only allowed change is `Active -> Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionStatus {
    Active,
    Finalized,
}

impl PromotionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PromotionStatus::Active => "active",
            PromotionStatus::Finalized => "finalized",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(PromotionStatus::Active),
            "finalized" => Some(PromotionStatus::Finalized),
            _ => None,
        }
    }

    pub const fn is_active(&self) -> bool {
        matches!(self, PromotionStatus::Active)
    }

    /// Guarded status change.
    pub fn transition(self, to: PromotionStatus) -> PointsResult<PromotionStatus> {
        match (self, to) {
            (PromotionStatus::Active, PromotionStatus::Finalized) => Ok(to),
            (from, to) => Err(PointsError::InvalidTransition {
                from: from.as_str(),
                to: to.as_str(),
            }),
        }
    }
}

impl fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Money paid for a recharge, in soles.
///
/// Positive, at most two decimal places and within `NUMERIC(10,2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RechargeAmount(Decimal);

impl RechargeAmount {
    pub fn new(value: Decimal) -> PointsResult<Self> {
        if value <= Decimal::ZERO {
            return Err(PointsError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if value.normalize().scale() > 2 {
            return Err(PointsError::Validation(
                "amount must have at most two decimal places".to_string(),
            ));
        }
        // NUMERIC(10,2) holds eight integer digits.
        if value >= Decimal::new(100_000_000, 0) {
            return Err(PointsError::Validation("amount is too large".to_string()));
        }
        Ok(Self(value.round_dp(2)))
    }

    pub fn from_db(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// Points credited by a recharge. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PointCount(i64);

impl PointCount {
    pub fn new(value: i64) -> PointsResult<Self> {
        if value <= 0 {
            return Err(PointsError::Validation(
                "points must be greater than zero".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn from_db(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [PromotionStatus::Active, PromotionStatus::Finalized] {
            assert_eq!(PromotionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PromotionStatus::parse("Active"), None);
        assert_eq!(PromotionStatus::parse("expired"), None);
    }

    #[test]
    fn test_only_active_to_finalized() {
        assert_eq!(
            PromotionStatus::Active
                .transition(PromotionStatus::Finalized)
                .unwrap(),
            PromotionStatus::Finalized
        );
        assert!(matches!(
            PromotionStatus::Active.transition(PromotionStatus::Active),
            Err(PointsError::InvalidTransition { .. })
        ));
        assert!(matches!(
            PromotionStatus::Finalized.transition(PromotionStatus::Active),
            Err(PointsError::InvalidTransition {
                from: "finalized",
                to: "active"
            })
        ));
        assert!(
            PromotionStatus::Finalized
                .transition(PromotionStatus::Finalized)
                .is_err()
        );
    }

    #[test]
    fn test_recharge_amount() {
        assert_eq!(
            RechargeAmount::new(Decimal::new(2550, 2)).unwrap().value(),
            Decimal::new(2550, 2)
        );
        // Trailing zeros beyond two places are fine.
        assert!(RechargeAmount::new(Decimal::new(10_000, 3)).is_ok());
        assert!(RechargeAmount::new(Decimal::ZERO).is_err());
        assert!(RechargeAmount::new(Decimal::new(-5, 0)).is_err());
        assert!(RechargeAmount::new(Decimal::new(1001, 3)).is_err());
        assert!(RechargeAmount::new(Decimal::new(100_000_000, 0)).is_err());
        assert!(RechargeAmount::new(Decimal::new(99_999_999_99, 2)).is_ok());
    }

    #[test]
    fn test_point_count() {
        assert_eq!(PointCount::new(500).unwrap().value(), 500);
        assert!(PointCount::new(0).is_err());
        assert!(PointCount::new(-1).is_err());
    }
}
