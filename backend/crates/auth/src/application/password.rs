//! New-password screening shared by registration and password change.

use crate::application::config::AuthConfig;
use crate::domain::value_object::user_password::{RawPassword, UserPassword, compromised_error};
use crate::error::{AuthError, AuthResult};

/// Policy check, optional breach lookup, then Argon2id hash.
pub(crate) async fn prepare_password(raw: String, config: &AuthConfig) -> AuthResult<UserPassword> {
    let raw = RawPassword::new(raw).map_err(AuthError::PasswordRejected)?;

    if config.check_breached_passwords {
        match raw.is_compromised().await {
            Ok(true) => return Err(AuthError::PasswordRejected(compromised_error())),
            Ok(false) => {}
            // Lookup outage does not block the user.
            Err(e) => tracing::warn!(error = %e, "Password breach check skipped"),
        }
    }

    Ok(UserPassword::from_raw(&raw, config.pepper())?)
}
