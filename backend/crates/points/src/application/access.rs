//! Who may touch whose ledger.

use auth::AuthenticatedUser;
use kernel::id::UserId;

use crate::error::{PointsError, PointsResult};

/// The caller acts on their own records; admins act on anyone's.
pub fn ensure_may_act_for(actor: &AuthenticatedUser, user_id: &UserId) -> PointsResult<()> {
    if actor.may_act_for(user_id) {
        Ok(())
    } else {
        tracing::warn!(actor = %actor.user_id, target = %user_id, "Ledger access denied");
        Err(PointsError::Forbidden)
    }
}
