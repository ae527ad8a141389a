//! Registration Use Cases
//!
//! Registering only parks the applicant as a pending registration and
//! mails a code. The account exists once the code is verified.

use std::sync::Arc;

use chrono::Utc;
use platform::token::TokenService;

use crate::application::code_lifecycle::{consume_code, issue_code, validate_code};
use crate::application::config::AuthConfig;
use crate::application::login::SignedInUser;
use crate::application::password::prepare_password;
use crate::domain::entity::{
    pending_registration::PendingRegistration, user::User, verification_code::EmailRegistration,
};
use crate::domain::mailer::{CodeMailer, CodeMessage};
use crate::domain::repository::{UserRepository, VerificationCodeRepository};
use crate::domain::value_object::{
    email::Email,
    person_name::{NameField, PersonName},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: Option<String>,
    pub email: String,
    pub password: String,
    pub role_id: i16,
}

pub struct RegisterUseCase<U, C, M>
where
    U: UserRepository,
    C: VerificationCodeRepository<EmailRegistration>,
    M: CodeMailer,
{
    user_repo: Arc<U>,
    code_repo: Arc<C>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, C, M> RegisterUseCase<U, C, M>
where
    U: UserRepository,
    C: VerificationCodeRepository<EmailRegistration>,
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

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<()> {
        let first_name = PersonName::new(&input.first_name, NameField::FirstName)?;
        let paternal_surname = PersonName::new(&input.paternal_surname, NameField::PaternalSurname)?;
        let maternal_surname = match input.maternal_surname.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => {
                Some(PersonName::new(value, NameField::MaternalSurname)?)
            }
            _ => None,
        };
        let email = Email::new(&input.email)?;
        let role = UserRole::from_id(input.role_id)
            .filter(UserRole::can_self_register)
            .ok_or(AuthError::RoleNotAllowed)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password = prepare_password(input.password, &self.config).await?;

        let pending = PendingRegistration {
            first_name,
            paternal_surname,
            maternal_surname,
            email: email.clone(),
            password,
            role,
        };

        let ttl = self.config.registration_code_ttl();
        let code =
            issue_code::<EmailRegistration, _>(&*self.code_repo, email, pending, Utc::now(), ttl)
                .await?;

        self.mailer
            .send_registration_code(&CodeMessage {
                to: code.owner.clone(),
                recipient_name: code.subject.first_name.to_string(),
                code: code.code.clone(),
                valid_for_minutes: ttl.num_minutes(),
            })
            .await?;

        tracing::info!(role = %role, "Registration code sent");

        Ok(())
    }
}

/// Turn a verified pending registration into an account and sign it in.
pub struct VerifyEmailUseCase<U, C>
where
    U: UserRepository,
    C: VerificationCodeRepository<EmailRegistration>,
{
    user_repo: Arc<U>,
    code_repo: Arc<C>,
    tokens: Arc<TokenService>,
}

impl<U, C> VerifyEmailUseCase<U, C>
where
    U: UserRepository,
    C: VerificationCodeRepository<EmailRegistration>,
{
    pub fn new(user_repo: Arc<U>, code_repo: Arc<C>, tokens: Arc<TokenService>) -> Self {
        Self {
            user_repo,
            code_repo,
            tokens,
        }
    }

    pub async fn execute(&self, email: String, code: String) -> AuthResult<SignedInUser> {
        let email = Email::new(email)?;
        let now = Utc::now();
        let stored =
            validate_code::<EmailRegistration, _>(&*self.code_repo, &email, &code, now).await?;

        let user = User::from_registration(stored.subject.clone(), now);
        self.user_repo.create(&user).await?;

        consume_code(&*self.code_repo, &stored).await?;

        let token = self
            .tokens
            .issue(*user.user_id.as_uuid(), user.email.as_str(), user.role.id())?;

        tracing::info!(user_id = %user.user_id, role = %user.role, "Email verified, account created");

        Ok(SignedInUser { user, token })
    }
}
