//! Resolve the caller from an access token.

use kernel::id::UserId;
use platform::token::TokenService;

use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// The caller behind a verified access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: Email,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Whether the caller may act on `user_id`'s records.
    pub fn may_act_for(&self, user_id: &UserId) -> bool {
        self.role.is_admin() || &self.user_id == user_id
    }
}

/// No token is `MissingToken`; a token that fails verification or names
/// an unknown role is `InvalidToken`.
pub fn authenticate(tokens: &TokenService, token: Option<&str>) -> AuthResult<AuthenticatedUser> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let claims = tokens.verify(token)?;
    let role = UserRole::from_id(claims.role).ok_or(AuthError::InvalidToken)?;

    Ok(AuthenticatedUser {
        user_id: UserId::from_uuid(claims.sub),
        email: Email::from_db(claims.email),
        role,
    })
}
