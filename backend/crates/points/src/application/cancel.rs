//! Cancel Promotion Use Case
//!
//! Finalize an active promotion today. Spent points stay spent.

use std::sync::Arc;

use auth::AuthenticatedUser;
use chrono::Utc;
use kernel::id::PromotionId;

use crate::application::access::ensure_may_act_for;
use crate::domain::entities::Promotion;
use crate::domain::repository::{LedgerTransaction, PromotionLedger};
use crate::error::{PointsError, PointsResult};

pub struct CancelPromotionUseCase<S>
where
    S: PromotionLedger,
{
    store: Arc<S>,
}

impl<S> CancelPromotionUseCase<S>
where
    S: PromotionLedger,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        actor: &AuthenticatedUser,
        promotion_id: &PromotionId,
    ) -> PointsResult<Promotion> {
        let mut tx = self.store.begin().await?;

        let mut promotion = tx
            .promotion_for_update(promotion_id)
            .await?
            .ok_or(PointsError::PromotionNotFound)?;
        ensure_may_act_for(actor, &promotion.user_id)?;

        promotion.cancel(Utc::now())?;
        tx.update_promotion(&promotion).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %promotion.user_id,
            room_id = %promotion.room_id,
            promotion_id = %promotion.id,
            "Promotion cancelled"
        );

        Ok(promotion)
    }
}
