//! History Use Cases
//!
//! Read-only views of a user's or a room's ledger.

use std::sync::Arc;

use auth::AuthenticatedUser;
use kernel::id::{RoomId, UserId};

use crate::application::access::ensure_may_act_for;
use crate::domain::entities::{PromotionRecord, Recharge};
use crate::domain::repository::LedgerRepository;
use crate::error::{PointsError, PointsResult};

/// A user's recharges and promotions, newest first.
#[derive(Debug, Clone)]
pub struct UserHistory {
    pub recharges: Vec<Recharge>,
    pub promotions: Vec<PromotionRecord>,
}

pub struct GetHistoryUseCase<L>
where
    L: LedgerRepository,
{
    ledger: Arc<L>,
}

impl<L> GetHistoryUseCase<L>
where
    L: LedgerRepository,
{
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    pub async fn execute(
        &self,
        actor: &AuthenticatedUser,
        user_id: &UserId,
    ) -> PointsResult<UserHistory> {
        ensure_may_act_for(actor, user_id)?;

        let recharges = self.ledger.recharges_for_user(user_id).await?;
        let promotions = self.ledger.promotions_for_user(user_id).await?;

        Ok(UserHistory {
            recharges,
            promotions,
        })
    }
}

pub struct RoomHistoryUseCase<L>
where
    L: LedgerRepository,
{
    ledger: Arc<L>,
}

impl<L> RoomHistoryUseCase<L>
where
    L: LedgerRepository,
{
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Unknown room is 404; someone else's room is 403 unless the caller
    /// is an admin.
    pub async fn execute(
        &self,
        actor: &AuthenticatedUser,
        room_id: &RoomId,
    ) -> PointsResult<Vec<PromotionRecord>> {
        let owner = self
            .ledger
            .room_owner(room_id)
            .await?
            .ok_or(PointsError::RoomNotFound)?;
        ensure_may_act_for(actor, &owner)?;

        self.ledger.promotions_for_room(room_id).await
    }
}
