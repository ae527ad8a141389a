//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use std::future::Future;

use kernel::id::{PlanId, PromotionId, RoomId, UserId};

use crate::domain::entities::{Plan, Promotion, PromotionRecord, Recharge};
use crate::error::PointsResult;

/// Reads and appends that need no lock.
#[trait_variant::make(LedgerRepository: Send)]
pub trait LocalLedgerRepository {
    /// Recharged points minus spent points. Unknown users have 0.
    async fn balance(&self, user_id: &UserId) -> PointsResult<i64>;

    async fn create_recharge(&self, recharge: &Recharge) -> PointsResult<()>;

    /// Newest first by `recharged_at`.
    async fn recharges_for_user(&self, user_id: &UserId) -> PointsResult<Vec<Recharge>>;

    /// Newest first by `start_date`, then `created_at`.
    async fn promotions_for_user(&self, user_id: &UserId) -> PointsResult<Vec<PromotionRecord>>;

    /// Newest first by `start_date`, then `created_at`.
    async fn promotions_for_room(&self, room_id: &RoomId) -> PointsResult<Vec<PromotionRecord>>;

    /// Owner of the room, `None` when it does not exist.
    async fn room_owner(&self, room_id: &RoomId) -> PointsResult<Option<UserId>>;
}

/// Promotion plans
#[trait_variant::make(PlanRepository: Send)]
pub trait LocalPlanRepository {
    /// Cheapest first.
    async fn list_plans(&self) -> PointsResult<Vec<Plan>>;

    async fn find_plan(&self, plan_id: &PlanId) -> PointsResult<Option<Plan>>;
}

/// One unit of work on the ledger.
///
/// Everything runs on a single connection. Dropping the transaction without
/// [`commit`](LedgerTransaction::commit) discards every write.
#[trait_variant::make(LedgerTransaction: Send)]
pub trait LocalLedgerTransaction {
    /// Serialize ledger writes for one user until the transaction ends.
    async fn lock_user(&mut self, user_id: &UserId) -> PointsResult<()>;

    async fn room_owner(&mut self, room_id: &RoomId) -> PointsResult<Option<UserId>>;

    /// Same formula as [`LedgerRepository::balance`], on this connection.
    async fn balance(&mut self, user_id: &UserId) -> PointsResult<i64>;

    /// Active promotions of `(user_id, room_id)`, row-locked.
    async fn active_promotions(
        &mut self,
        user_id: &UserId,
        room_id: &RoomId,
    ) -> PointsResult<Vec<Promotion>>;

    /// One promotion, row-locked.
    async fn promotion_for_update(
        &mut self,
        promotion_id: &PromotionId,
    ) -> PointsResult<Option<Promotion>>;

    async fn insert_promotion(&mut self, promotion: &Promotion) -> PointsResult<()>;

    async fn update_promotion(&mut self, promotion: &Promotion) -> PointsResult<()>;

    async fn commit(self) -> PointsResult<()>;
}

/// Opens ledger transactions.
pub trait PromotionLedger: Send + Sync {
    type Tx: LedgerTransaction;

    fn begin(&self) -> impl Future<Output = PointsResult<Self::Tx>> + Send;
}

/// Everything the points handlers need from storage.
pub trait PointsStore:
    LedgerRepository + PlanRepository + PromotionLedger + Send + Sync + 'static
{
}

impl<T> PointsStore for T where
    T: LedgerRepository + PlanRepository + PromotionLedger + Send + Sync + 'static
{
}
