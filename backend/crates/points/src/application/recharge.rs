//! Recharge Use Case
//!
//! Buy points. Recharge rows are append-only.

use std::sync::Arc;

use auth::AuthenticatedUser;
use chrono::Utc;
use kernel::id::UserId;
use rust_decimal::Decimal;

use crate::application::access::ensure_may_act_for;
use crate::domain::entities::Recharge;
use crate::domain::repository::LedgerRepository;
use crate::domain::value_objects::{PointCount, RechargeAmount};
use crate::error::PointsResult;

#[derive(Debug, Clone)]
pub struct RechargeInput {
    pub user_id: UserId,
    pub amount: Decimal,
    pub points: i64,
}

pub struct RechargeUseCase<L>
where
    L: LedgerRepository,
{
    ledger: Arc<L>,
}

impl<L> RechargeUseCase<L>
where
    L: LedgerRepository,
{
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    pub async fn execute(
        &self,
        actor: &AuthenticatedUser,
        input: RechargeInput,
    ) -> PointsResult<Recharge> {
        ensure_may_act_for(actor, &input.user_id)?;

        let amount = RechargeAmount::new(input.amount)?;
        let points = PointCount::new(input.points)?;
        let recharge = Recharge::new(input.user_id, amount, points, Utc::now());

        self.ledger.create_recharge(&recharge).await?;

        tracing::info!(
            user_id = %recharge.user_id,
            recharge_id = %recharge.id,
            points = recharge.points.value(),
            amount = %recharge.amount.value(),
            "Points recharged"
        );

        Ok(recharge)
    }
}
