//! Password Recovery Use Cases
//!
//! Request a code, check it, then change the password with it.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;

use crate::application::code_lifecycle::{consume_code, issue_code, validate_code};
use crate::application::config::AuthConfig;
use crate::application::password::prepare_password;
use crate::domain::entity::verification_code::PasswordRecovery;
use crate::domain::mailer::{CodeMailer, CodeMessage};
use crate::domain::repository::{UserRepository, VerificationCodeRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Request a recovery code
// ============================================================================

pub struct RequestPasswordRecoveryUseCase<U, C, M>
where
    U: UserRepository,
    C: VerificationCodeRepository<PasswordRecovery>,
    M: CodeMailer,
{
    user_repo: Arc<U>,
    code_repo: Arc<C>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, C, M> RequestPasswordRecoveryUseCase<U, C, M>
where
    U: UserRepository,
    C: VerificationCodeRepository<PasswordRecovery>,
    M: CodeMailer,
{
    pub fn new(user_repo: Arc<U>, code_repo: Arc<C>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            code_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: String) -> AuthResult<()> {
        let email = Email::new(email)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let ttl = self.config.recovery_code_ttl();
        let code = issue_code::<PasswordRecovery, _>(
            &*self.code_repo,
            email,
            user.user_id,
            Utc::now(),
            ttl,
        )
        .await?;

        self.mailer
            .send_recovery_code(&CodeMessage {
                to: code.owner.clone(),
                recipient_name: user.first_name.to_string(),
                code: code.code.clone(),
                valid_for_minutes: ttl.num_minutes(),
            })
            .await?;

        tracing::info!(user_id = %user.user_id, "Password recovery code sent");

        Ok(())
    }
}

// ============================================================================
// Check a recovery code
// ============================================================================

pub struct VerifyRecoveryCodeUseCase<C>
where
    C: VerificationCodeRepository<PasswordRecovery>,
{
    code_repo: Arc<C>,
}

impl<C> VerifyRecoveryCodeUseCase<C>
where
    C: VerificationCodeRepository<PasswordRecovery>,
{
    pub fn new(code_repo: Arc<C>) -> Self {
        Self { code_repo }
    }

    /// Does not consume the code; the password change does.
    pub async fn execute(&self, email: String, code: String) -> AuthResult<UserId> {
        let email = Email::new(email)?;
        let stored =
            validate_code::<PasswordRecovery, _>(&*self.code_repo, &email, &code, Utc::now())
                .await?;
        Ok(stored.subject)
    }
}

// ============================================================================
// Change the password
// ============================================================================

pub struct ChangePasswordInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U, C>
where
    U: UserRepository,
    C: VerificationCodeRepository<PasswordRecovery>,
{
    user_repo: Arc<U>,
    code_repo: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<U, C> ChangePasswordUseCase<U, C>
where
    U: UserRepository,
    C: VerificationCodeRepository<PasswordRecovery>,
{
    pub fn new(user_repo: Arc<U>, code_repo: Arc<C>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            code_repo,
            config,
        }
    }

    pub async fn execute(&self, input: ChangePasswordInput) -> AuthResult<()> {
        let email = Email::new(input.email)?;
        let stored =
            validate_code::<PasswordRecovery, _>(&*self.code_repo, &email, &input.code, Utc::now())
                .await?;

        let password = prepare_password(input.new_password, &self.config).await?;

        if !self
            .user_repo
            .update_password(&stored.subject, &password)
            .await?
        {
            return Err(AuthError::PasswordNotChanged);
        }

        consume_code(&*self.code_repo, &stored).await?;

        tracing::info!(user_id = %stored.subject, "Password changed via recovery code");

        Ok(())
    }
}
