//! Outbound mail port

use crate::domain::value_object::{email::Email, one_time_code::OneTimeCode};
use crate::error::AuthResult;

/// Everything a code mail needs.
#[derive(Debug, Clone)]
pub struct CodeMessage {
    pub to: Email,
    pub recipient_name: String,
    pub code: OneTimeCode,
    pub valid_for_minutes: i64,
}

/// Delivers verification codes. Failures are `AuthError::MailDelivery`.
#[trait_variant::make(CodeMailer: Send)]
pub trait LocalCodeMailer {
    async fn send_recovery_code(&self, message: &CodeMessage) -> AuthResult<()>;

    async fn send_registration_code(&self, message: &CodeMessage) -> AuthResult<()>;
}
