//! API DTOs (Data Transfer Objects)
//!
//! Request fields are optional so a missing field is reported as a 400
//! with the field name instead of a deserializer rejection.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{PlanId, PromotionId, RechargeId, RoomId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Plan, Promotion, PromotionRecord, Recharge};
use crate::error::{PointsError, PointsResult};

pub(crate) fn required<T>(value: Option<T>, field: &str) -> PointsResult<T> {
    value.ok_or_else(|| PointsError::Validation(format!("{} is required", field)))
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RechargeRequest {
    pub user_id: Option<UserId>,
    pub amount: Option<Decimal>,
    pub points: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromoteRequest {
    pub user_id: Option<UserId>,
    pub room_id: Option<RoomId>,
    pub plan_id: Option<PlanId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelPromotionRequest {
    pub promotion_id: Option<PromotionId>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RechargeResponse {
    pub message: String,
    pub recharge_id: RechargeId,
    pub recharge_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub id: PlanId,
    pub name: String,
    pub cost_points: i64,
    pub duration_days: i32,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            cost_points: plan.cost_points,
            duration_days: plan.duration_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<PlanResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RechargeEntry {
    pub id: RechargeId,
    pub amount: Decimal,
    pub points: i64,
    pub recharged_at: DateTime<Utc>,
}

impl From<Recharge> for RechargeEntry {
    fn from(recharge: Recharge) -> Self {
        Self {
            id: recharge.id,
            amount: recharge.amount.value(),
            points: recharge.points.value(),
            recharged_at: recharge.recharged_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromotionResponse {
    pub id: PromotionId,
    pub user_id: UserId,
    pub room_id: RoomId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub points_spent: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: &'static str,
    pub remaining_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromotionResponse {
    pub fn new(promotion: Promotion, room_name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            remaining_days: promotion.remaining_days(now),
            id: promotion.id,
            user_id: promotion.user_id,
            room_id: promotion.room_id,
            room_name,
            plan_id: promotion.plan_id,
            plan_name: promotion.plan_name,
            points_spent: promotion.points_spent,
            start_date: promotion.start_date,
            end_date: promotion.end_date,
            status: promotion.status.as_str(),
            created_at: promotion.created_at,
            updated_at: promotion.updated_at,
        }
    }

    pub fn from_record(record: PromotionRecord, now: DateTime<Utc>) -> Self {
        Self::new(record.promotion, Some(record.room_name), now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub recharges: Vec<RechargeEntry>,
    pub promotions: Vec<PromotionResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomHistoryResponse {
    pub history: Vec<PromotionResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoteResponse {
    pub message: String,
    pub outcome: &'static str,
    pub promotion: PromotionResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelPromotionResponse {
    pub message: String,
    pub promotion: PromotionResponse,
}
