//! Startup cleanup of codes nobody used.

use chrono::{DateTime, Utc};

use crate::domain::entity::verification_code::{EmailRegistration, PasswordRecovery};
use crate::domain::repository::VerificationCodeRepository;
use crate::error::AuthResult;

/// Purged counts per purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub recovery_codes: u64,
    pub pending_registrations: u64,
}

/// Clear expired recovery codes and delete expired pending registrations.
pub async fn purge_expired_codes<R>(repo: &R, now: DateTime<Utc>) -> AuthResult<PurgeReport>
where
    R: VerificationCodeRepository<PasswordRecovery> + VerificationCodeRepository<EmailRegistration>,
{
    let recovery_codes =
        VerificationCodeRepository::<PasswordRecovery>::purge_expired(repo, now).await?;
    let pending_registrations =
        VerificationCodeRepository::<EmailRegistration>::purge_expired(repo, now).await?;

    tracing::info!(recovery_codes, pending_registrations, "Expired verification codes purged");

    Ok(PurgeReport {
        recovery_codes,
        pending_registrations,
    })
}
