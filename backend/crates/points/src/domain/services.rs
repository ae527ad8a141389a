//! Domain Services
//!
//! Pure ledger rules. Callers hold the per-user lock while applying them.

use chrono::{DateTime, Utc};
use kernel::id::{RoomId, UserId};

use super::entities::{Plan, Promotion};
use crate::error::{PointsError, PointsResult};

/// Points available to spend.
pub fn compute_balance(total_recharged: i64, total_spent: i64) -> i64 {
    total_recharged - total_spent
}

/// Reject a purchase the balance cannot cover.
pub fn ensure_affordable(balance: i64, plan: &Plan) -> PointsResult<()> {
    if balance < plan.cost_points {
        return Err(PointsError::InsufficientPoints {
            balance,
            required: plan.cost_points,
        });
    }
    Ok(())
}

/// What a promotion purchase did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionOutcome {
    Created,
    Renewed,
}

impl PromotionOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PromotionOutcome::Created => "created",
            PromotionOutcome::Renewed => "renewed",
        }
    }
}

/// Decide between a new promotion and renewing the active one.
///
/// `active` holds the active promotions of `(user_id, room_id)`. More than
/// one is a corrupted ledger and nothing should be written.
pub fn apply_plan(
    mut active: Vec<Promotion>,
    user_id: UserId,
    room_id: RoomId,
    plan: &Plan,
    now: DateTime<Utc>,
) -> PointsResult<(Promotion, PromotionOutcome)> {
    match active.len() {
        0 => Ok((
            Promotion::activate(user_id, room_id, plan, now),
            PromotionOutcome::Created,
        )),
        1 => {
            let mut current = active.remove(0);
            current.renew(plan, now)?;
            Ok((current, PromotionOutcome::Renewed))
        }
        _ => {
            let ids: Vec<_> = active.iter().map(|p| p.id).collect();
            Err(PointsError::two_active(user_id, room_id, &ids))
        }
    }
}
