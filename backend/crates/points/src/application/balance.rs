use std::sync::Arc;

use auth::AuthenticatedUser;
use kernel::id::UserId;

use crate::application::access::ensure_may_act_for;
use crate::domain::repository::LedgerRepository;
use crate::error::PointsResult;

pub struct GetBalanceUseCase<L>
where
    L: LedgerRepository,
{
    ledger: Arc<L>,
}

impl<L> GetBalanceUseCase<L>
where
    L: LedgerRepository,
{
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    pub async fn execute(&self, actor: &AuthenticatedUser, user_id: &UserId) -> PointsResult<i64> {
        ensure_may_act_for(actor, user_id)?;
        self.ledger.balance(user_id).await
    }
}
