//! Verification code lifecycle shared by recovery and registration.
//!
//! `issue` overwrites, `validate` never mutates, `consume` clears the code
//! only if it is still the one that was validated. Callers consume once,
//! after their own side effect has committed.

use chrono::{DateTime, Duration, Utc};

use crate::domain::entity::verification_code::{CodePurpose, VerificationCode};
use crate::domain::repository::VerificationCodeRepository;
use crate::domain::value_object::{email::Email, one_time_code::OneTimeCode};
use crate::error::{AuthError, AuthResult};

pub async fn issue_code<P, R>(
    repo: &R,
    owner: Email,
    subject: P::Subject,
    now: DateTime<Utc>,
    ttl: Duration,
) -> AuthResult<VerificationCode<P>>
where
    P: CodePurpose,
    R: VerificationCodeRepository<P>,
{
    let code = VerificationCode::<P>::issue(owner, subject, now, ttl);
    repo.store(&code).await?;

    tracing::debug!(purpose = P::NAME, expires_at = %code.expires_at, "Verification code issued");

    Ok(code)
}

/// Look up and check a submitted code. Malformed input, a missing code and
/// a wrong code all fail as `InvalidCode`.
pub async fn validate_code<P, R>(
    repo: &R,
    owner: &Email,
    submitted: &str,
    now: DateTime<Utc>,
) -> AuthResult<VerificationCode<P>>
where
    P: CodePurpose,
    R: VerificationCodeRepository<P>,
{
    let submitted = OneTimeCode::parse(submitted).ok_or(AuthError::InvalidCode)?;
    let stored = repo.find(owner).await?.ok_or(AuthError::InvalidCode)?;

    stored.check(&submitted, now).map_err(|rejection| {
        tracing::debug!(purpose = P::NAME, reason = rejection.reason(), "Code check failed");
        AuthError::from(rejection)
    })?;

    Ok(stored)
}

pub async fn consume_code<P, R>(repo: &R, code: &VerificationCode<P>) -> AuthResult<()>
where
    P: CodePurpose,
    R: VerificationCodeRepository<P>,
{
    if !repo.consume(&code.owner, &code.code).await? {
        // Already cleared by a concurrent request or superseded by a reissue.
        tracing::warn!(purpose = P::NAME, "Verification code was already consumed");
    }
    Ok(())
}
