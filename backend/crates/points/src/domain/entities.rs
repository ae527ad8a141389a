//! Domain Entities

use chrono::{DateTime, Days, NaiveDate, Timelike, Utc};
use kernel::id::{PlanId, PromotionId, RechargeId, RoomId, UserId};

use super::value_objects::{PointCount, PromotionStatus, RechargeAmount};
use crate::error::{PointsError, PointsResult};

/// A promotion plan. Reference data seeded by migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub cost_points: i64,
    pub duration_days: i32,
}

impl Plan {
    /// `date` moved forward by this plan's duration.
    fn extend(&self, date: NaiveDate) -> NaiveDate {
        let days = Days::new(u64::try_from(self.duration_days).unwrap_or(0));
        date.checked_add_days(days).unwrap_or(NaiveDate::MAX)
    }
}

/// A purchase of points. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recharge {
    pub id: RechargeId,
    pub user_id: UserId,
    pub amount: RechargeAmount,
    pub points: PointCount,
    pub recharged_at: DateTime<Utc>,
}

impl Recharge {
    pub fn new(
        user_id: UserId,
        amount: RechargeAmount,
        points: PointCount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RechargeId::new(),
            user_id,
            amount,
            points,
            recharged_at: now,
        }
    }
}

/// Paid promotion of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub id: PromotionId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub points_spent: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PromotionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// A fresh promotion starting today.
    pub fn activate(user_id: UserId, room_id: RoomId, plan: &Plan, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self {
            id: PromotionId::new(),
            user_id,
            room_id,
            plan_id: plan.id,
            plan_name: plan.name.clone(),
            points_spent: plan.cost_points,
            start_date: today,
            end_date: plan.extend(today),
            status: PromotionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Extend an active promotion by another plan period.
    ///
    /// The end date moves from the current end, not from today.
    pub fn renew(&mut self, plan: &Plan, now: DateTime<Utc>) -> PointsResult<()> {
        if !self.status.is_active() {
            return Err(PointsError::AlreadyFinalized);
        }
        self.end_date = plan.extend(self.end_date);
        self.points_spent += plan.cost_points;
        self.plan_id = plan.id;
        self.plan_name = plan.name.clone();
        self.updated_at = now;
        Ok(())
    }

    /// Finalize now. Points already spent are not refunded.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> PointsResult<()> {
        if !self.status.is_active() {
            return Err(PointsError::AlreadyFinalized);
        }
        self.status = self.status.transition(PromotionStatus::Finalized)?;
        self.end_date = now.date_naive();
        self.updated_at = now;
        Ok(())
    }

    /// Whole days left, rounded up, never negative.
    ///
    /// `end_date` counts from the start of that day in UTC.
    pub fn remaining_days(&self, now: DateTime<Utc>) -> i64 {
        const DAY: i64 = 86_400;
        let days_ahead = (self.end_date - now.date_naive()).num_days();
        let seconds = days_ahead * DAY - i64::from(now.num_seconds_from_midnight());
        if seconds <= 0 {
            return 0;
        }
        (seconds + DAY - 1) / DAY
    }
}

/// A promotion as listed in a history, with its room's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRecord {
    pub promotion: Promotion,
    pub room_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plan(cost: i64, days: i32) -> Plan {
        Plan {
            id: PlanId::new(),
            name: format!("plan-{cost}"),
            cost_points: cost,
            duration_days: days,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_activate() {
        let now = at(2024, 3, 1, 15);
        let promo = Promotion::activate(UserId::new(), RoomId::new(), &plan(400, 7), now);

        assert_eq!(promo.status, PromotionStatus::Active);
        assert_eq!(promo.points_spent, 400);
        assert_eq!(promo.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(promo.end_date, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
    }

    #[test]
    fn test_renew_extends_from_current_end() {
        let now = at(2024, 3, 1, 15);
        let mut promo = Promotion::activate(UserId::new(), RoomId::new(), &plan(400, 7), now);
        let premium = plan(500, 30);

        promo.renew(&premium, at(2024, 3, 3, 9)).unwrap();

        assert_eq!(promo.end_date, NaiveDate::from_ymd_opt(2024, 4, 7).unwrap());
        assert_eq!(promo.points_spent, 900);
        assert_eq!(promo.plan_id, premium.id);
        assert_eq!(promo.plan_name, "plan-500");
        assert_eq!(promo.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_cancel_and_double_cancel() {
        let mut promo =
            Promotion::activate(UserId::new(), RoomId::new(), &plan(100, 7), at(2024, 3, 1, 8));

        promo.cancel(at(2024, 3, 4, 10)).unwrap();
        assert_eq!(promo.status, PromotionStatus::Finalized);
        assert_eq!(promo.end_date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(promo.points_spent, 100);

        assert!(matches!(
            promo.cancel(at(2024, 3, 5, 10)),
            Err(PointsError::AlreadyFinalized)
        ));
        assert!(matches!(
            promo.renew(&plan(100, 7), at(2024, 3, 5, 10)),
            Err(PointsError::AlreadyFinalized)
        ));
    }

    #[test]
    fn test_remaining_days_rounds_up_and_floors_at_zero() {
        let promo =
            Promotion::activate(UserId::new(), RoomId::new(), &plan(100, 7), at(2024, 3, 1, 0));
        // Ends at 2024-03-08T00:00Z.
        assert_eq!(promo.remaining_days(at(2024, 3, 1, 0)), 7);
        assert_eq!(promo.remaining_days(at(2024, 3, 1, 1)), 7);
        assert_eq!(promo.remaining_days(at(2024, 3, 7, 23)), 1);
        assert_eq!(promo.remaining_days(at(2024, 3, 8, 0)), 0);
        assert_eq!(promo.remaining_days(at(2024, 4, 1, 0)), 0);
    }
}
