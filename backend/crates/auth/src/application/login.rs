//! Login Use Case
//!
//! Email and password in, access token out.

use std::sync::Arc;

use platform::token::{AccessToken, TokenService};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// An account together with a fresh access token.
pub struct SignedInUser {
    pub user: User,
    pub token: AccessToken,
}

pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: Arc<TokenService>,
    config: Arc<AuthConfig>,
}

impl<U> LoginUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<TokenService>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, email: String, password: String) -> AuthResult<SignedInUser> {
        let email = Email::new(email)?;
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let password = RawPassword::for_login(password);
        if !user.password.verify(&password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(*user.user_id.as_uuid(), user.email.as_str(), user.role.id())?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(SignedInUser { user, token })
    }
}
