//! Verification Code Entity
//!
//! One lifecycle shared by every flow that mails a code: issue, validate,
//! consume. The purpose type decides what a valid code unlocks.
//!
//! `Issued -> Consumed` or `Issued -> Expired`; nothing leaves those.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use std::fmt;

use crate::domain::entity::pending_registration::PendingRegistration;
use crate::domain::value_object::{email::Email, one_time_code::OneTimeCode};

/// What a code is for, and what it is attached to.
pub trait CodePurpose: Send + Sync + 'static {
    /// The record a valid code unlocks.
    type Subject: Clone + fmt::Debug + Send + Sync;

    /// Used in log fields.
    const NAME: &'static str;
}

/// Code stored on an existing user row; unlocks a password change.
#[derive(Debug, Clone, Copy)]
pub struct PasswordRecovery;

impl CodePurpose for PasswordRecovery {
    type Subject = UserId;
    const NAME: &'static str = "password_recovery";
}

/// Code stored with a pending registration; unlocks account creation.
#[derive(Debug, Clone, Copy)]
pub struct EmailRegistration;

impl CodePurpose for EmailRegistration {
    type Subject = PendingRegistration;
    const NAME: &'static str = "email_registration";
}

/// Why a submitted code was refused. Kept apart for logging only;
/// clients see one message for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRejection {
    Mismatch,
    Expired,
}

impl CodeRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            CodeRejection::Mismatch => "mismatch",
            CodeRejection::Expired => "expired",
        }
    }
}

/// The single outstanding code for one owner.
#[derive(Debug, Clone)]
pub struct VerificationCode<P: CodePurpose> {
    pub owner: Email,
    pub subject: P::Subject,
    pub code: OneTimeCode,
    pub expires_at: DateTime<Utc>,
}

impl<P: CodePurpose> VerificationCode<P> {
    pub fn issue(owner: Email, subject: P::Subject, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            owner,
            subject,
            code: OneTimeCode::generate(),
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Compare first, then check the window: an expired code is only
    /// reported as expired when it was the right one.
    pub fn check(&self, submitted: &OneTimeCode, now: DateTime<Utc>) -> Result<(), CodeRejection> {
        if !self.code.matches(submitted) {
            return Err(CodeRejection::Mismatch);
        }
        if self.is_expired(now) {
            return Err(CodeRejection::Expired);
        }
        Ok(())
    }
}
