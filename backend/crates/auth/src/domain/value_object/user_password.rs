//! User Password Value Object
//!
//! Domain wrapper over `platform::password`: policy failures become
//! user-facing `AppError`s, hashing failures become internal ones.

use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
use platform::password::{
    ClearTextPassword, HashedPassword, PasswordHashError, PasswordPolicyError,
};
use std::fmt;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input. Zeroized on drop.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a new password (registration, password change).
    ///
    /// ## Errors
    /// Returns `AppError` with a user-facing message and suggested action
    pub fn new(raw: String) -> AppResult<Self> {
        ClearTextPassword::new(raw)
            .map(Self)
            .map_err(policy_error)
    }

    /// Wrap a password submitted at login. No policy applies: a stored
    /// password predating a policy change must still be accepted.
    pub fn for_login(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }

    /// HIBP lookup (k-anonymity).
    ///
    /// ## Returns
    /// - `Ok(true)` if compromised
    /// - `Ok(false)` if not found in breaches
    /// - `Err(_)` if the lookup failed (callers treat it as non-blocking)
    pub async fn is_compromised(&self) -> AppResult<bool> {
        self.0
            .check_breach()
            .await
            .map_err(|e| AppError::service_unavailable(e.to_string()))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

fn policy_error(err: PasswordPolicyError) -> AppError {
    match err {
        PasswordPolicyError::TooShort { min, actual } => AppError::bad_request(format!(
            "Password must be at least {} characters (got {})",
            min, actual
        ))
        .with_action("Please choose a longer password"),

        PasswordPolicyError::TooLong { max, actual } => AppError::bad_request(format!(
            "Password must be at most {} characters (got {})",
            max, actual
        ))
        .with_action("Please choose a shorter password"),

        PasswordPolicyError::EmptyOrWhitespace => {
            AppError::bad_request("Password cannot be empty").with_action("Please enter a password")
        }

        PasswordPolicyError::InvalidCharacter => {
            AppError::bad_request("Password contains invalid characters")
                .with_action("Please remove any special control characters")
        }

        PasswordPolicyError::CommonPattern => {
            AppError::bad_request("Password is too common or follows a predictable pattern")
                .with_action("Please choose a more unique password")
        }

        PasswordPolicyError::Compromised => compromised_error(),
    }
}

/// Rejection used when the breach lookup reports a hit.
pub fn compromised_error() -> AppError {
    AppError::bad_request("This password has been found in a data breach")
        .with_action("Please choose a different password")
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Argon2id PHC string. Safe to store.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        let hashed = raw.inner().hash(pepper).map_err(|e| match e {
            PasswordHashError::HashingFailed(msg) => {
                AppError::internal(format!("Password hashing failed: {}", msg))
            }
            _ => AppError::internal("Unexpected error during password hashing"),
        })?;

        Ok(Self(hashed))
    }

    /// Create from the stored PHC string
    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|_| {
                AppError::new(
                    ErrorKind::InternalServerError,
                    "Invalid password hash in database",
                )
            })
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Constant-time. `pepper` must match the one used when hashing.
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

    #[test]
    fn test_raw_password_validation() {
        assert!(RawPassword::new("Cuarto-Lima-2024".to_string()).is_ok());

        let short = "k".repeat(MIN_PASSWORD_LENGTH - 1);
        let err = RawPassword::new(short).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.action().is_some());

        assert!(RawPassword::new("x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
        assert!(RawPassword::new("password123".to_string()).is_err());
        assert!(RawPassword::new("".to_string()).is_err());
    }

    #[test]
    fn test_login_password_skips_policy() {
        let raw = RawPassword::for_login("short".to_string());
        assert!(format!("{:?}", raw).contains("REDACTED"));
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("Cuarto-Lima-2024".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();

        assert!(hashed.verify(&raw, None));
        assert!(hashed.verify(&RawPassword::for_login("Cuarto-Lima-2024".to_string()), None));
        assert!(!hashed.verify(&RawPassword::for_login("Cuarto-Lima-2025".to_string()), None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let raw = RawPassword::new("Cuarto-Lima-2024".to_string()).unwrap();
        let pepper = b"app_secret_pepper";
        let hashed = UserPassword::from_raw(&raw, Some(pepper)).unwrap();

        assert!(hashed.verify(&raw, Some(pepper)));
        assert!(!hashed.verify(&raw, None));
        assert!(!hashed.verify(&raw, Some(b"wrong")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let raw = RawPassword::new("Cuarto-Lima-2024".to_string()).unwrap();
        let phc = UserPassword::from_raw(&raw, None).unwrap().as_phc_string().to_string();

        assert!(UserPassword::from_phc_string(phc).unwrap().verify(&raw, None));
        assert!(UserPassword::from_phc_string("not-a-hash").is_err());
    }
}
