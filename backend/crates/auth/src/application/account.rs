//! Account maintenance for signed-in users: own password and, for admins,
//! other users' roles.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;

use crate::application::authenticate::AuthenticatedUser;
use crate::application::config::AuthConfig;
use crate::application::password::prepare_password;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{user_password::RawPassword, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Own password
// ============================================================================

pub struct UpdatePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// Password change that proves knowledge of the current password instead
/// of a mailed code.
pub struct UpdatePasswordUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> UpdatePasswordUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, user_id: &UserId, input: UpdatePasswordInput) -> AuthResult<()> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let current = RawPassword::for_login(input.current_password);
        if !user.password.verify(&current, self.config.pepper()) {
            return Err(AuthError::WrongCurrentPassword);
        }

        let password = prepare_password(input.new_password, &self.config).await?;
        user.set_password(password, Utc::now());

        if !self
            .user_repo
            .update_password(&user.user_id, &user.password)
            .await?
        {
            return Err(AuthError::PasswordNotChanged);
        }

        tracing::info!(user_id = %user.user_id, "Password changed by account owner");

        Ok(())
    }
}

// ============================================================================
// Role
// ============================================================================

/// Admin-only role change.
///
/// The caller's role is read from the store, so a demoted admin loses the
/// right immediately even while holding an older token.
pub struct UpdateRoleUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UpdateRoleUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(
        &self,
        caller: &AuthenticatedUser,
        target: &UserId,
        role_id: i16,
    ) -> AuthResult<User> {
        let is_admin = self
            .user_repo
            .find_by_id(&caller.user_id)
            .await?
            .is_some_and(|user| user.role.is_admin());
        if !is_admin {
            tracing::warn!(caller = %caller.user_id, target = %target, "Role change denied");
            return Err(AuthError::Forbidden);
        }

        let role = UserRole::from_id(role_id)
            .ok_or_else(|| AuthError::Validation(format!("Unknown role_id {}", role_id)))?;

        if !self.user_repo.update_role(target, role).await? {
            return Err(AuthError::UserNotFound);
        }

        let user = self
            .user_repo
            .find_by_id(target)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(
            caller = %caller.user_id,
            user_id = %target,
            role = %role,
            "User role updated"
        );

        Ok(user)
    }
}
