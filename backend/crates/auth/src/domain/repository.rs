//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use std::future::Future;

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entity::{
    user::User,
    verification_code::{CodePurpose, EmailRegistration, PasswordRecovery, VerificationCode},
};
use crate::domain::value_object::{
    email::Email, one_time_code::OneTimeCode, user_password::UserPassword, user_role::UserRole,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a user. `AuthError::EmailTaken` if the email is already in use.
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Replace the password hash. Returns false when no row was updated.
    async fn update_password(&self, user_id: &UserId, password: &UserPassword)
    -> AuthResult<bool>;

    /// Change the role and keep the partner profile in step with it.
    /// Returns false when the user does not exist.
    async fn update_role(&self, user_id: &UserId, role: UserRole) -> AuthResult<bool>;
}

/// Storage for the outstanding code of each owner, per purpose.
///
/// Written with explicit `Send` futures since the trait is generic over
/// the purpose.
pub trait VerificationCodeRepository<P: CodePurpose>: Send + Sync {
    /// Store the code, replacing any earlier one for the same owner.
    fn store(&self, code: &VerificationCode<P>) -> impl Future<Output = AuthResult<()>> + Send;

    /// The outstanding code for `owner`, expired or not.
    fn find(
        &self,
        owner: &Email,
    ) -> impl Future<Output = AuthResult<Option<VerificationCode<P>>>> + Send;

    /// Clear the stored code if it is still `code`. Returns whether
    /// anything was cleared.
    fn consume(
        &self,
        owner: &Email,
        code: &OneTimeCode,
    ) -> impl Future<Output = AuthResult<bool>> + Send;

    /// Drop every code that expired before `now`. Returns how many.
    fn purge_expired(&self, now: DateTime<Utc>) -> impl Future<Output = AuthResult<u64>> + Send;
}

/// Everything the auth routes need from one store.
pub trait AuthStore:
    UserRepository
    + VerificationCodeRepository<PasswordRecovery>
    + VerificationCodeRepository<EmailRegistration>
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + VerificationCodeRepository<PasswordRecovery>
        + VerificationCodeRepository<EmailRegistration>
        + Send
        + Sync
        + 'static
{
}
