//! Promote Room Use Case
//!
//! Spend points on a plan for one of the user's rooms. Creates a promotion
//! or renews the active one.
//!
//! Balance check, decision and write run in one transaction under a
//! per-user lock, so two concurrent purchases cannot both pass the check
//! against the same balance.

use std::sync::Arc;

use auth::AuthenticatedUser;
use chrono::Utc;
use kernel::id::{PlanId, RoomId, UserId};

use crate::application::access::ensure_may_act_for;
use crate::domain::entities::Promotion;
use crate::domain::repository::{LedgerTransaction, PlanRepository, PromotionLedger};
use crate::domain::services::{PromotionOutcome, apply_plan, ensure_affordable};
use crate::error::{PointsError, PointsResult};

#[derive(Debug, Clone)]
pub struct PromoteInput {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub plan_id: PlanId,
}

#[derive(Debug, Clone)]
pub struct PromoteOutput {
    pub promotion: Promotion,
    pub outcome: PromotionOutcome,
}

pub struct PromoteRoomUseCase<S>
where
    S: PromotionLedger + PlanRepository,
{
    store: Arc<S>,
}

impl<S> PromoteRoomUseCase<S>
where
    S: PromotionLedger + PlanRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        actor: &AuthenticatedUser,
        input: PromoteInput,
    ) -> PointsResult<PromoteOutput> {
        ensure_may_act_for(actor, &input.user_id)?;

        let plan = self
            .store
            .find_plan(&input.plan_id)
            .await?
            .ok_or(PointsError::PlanNotFound)?;

        let mut tx = self.store.begin().await?;
        tx.lock_user(&input.user_id).await?;

        let owner = tx
            .room_owner(&input.room_id)
            .await?
            .ok_or(PointsError::RoomNotFound)?;
        if owner != input.user_id {
            return Err(PointsError::Forbidden);
        }

        let balance = tx.balance(&input.user_id).await?;
        ensure_affordable(balance, &plan)?;

        let active = tx.active_promotions(&input.user_id, &input.room_id).await?;
        let (promotion, outcome) =
            apply_plan(active, input.user_id, input.room_id, &plan, Utc::now())?;

        match outcome {
            PromotionOutcome::Created => tx.insert_promotion(&promotion).await?,
            PromotionOutcome::Renewed => tx.update_promotion(&promotion).await?,
        }
        tx.commit().await?;

        tracing::info!(
            user_id = %promotion.user_id,
            room_id = %promotion.room_id,
            promotion_id = %promotion.id,
            plan_id = %plan.id,
            outcome = outcome.as_str(),
            points = plan.cost_points,
            balance_after = balance - plan.cost_points,
            "Room promotion purchased"
        );

        Ok(PromoteOutput { promotion, outcome })
    }
}
