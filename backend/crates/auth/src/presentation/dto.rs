//! API DTOs (Data Transfer Objects)
//!
//! Request fields are optional so a missing field is reported as a 400
//! with the field name instead of a deserializer rejection.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

use crate::application::login::SignedInUser;
use crate::domain::entity::user::User;
use crate::error::{AuthError, AuthResult};

/// Present and not blank.
pub(crate) fn required(value: Option<String>, field: &str) -> AuthResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AuthError::Validation(format!("{} is required", field))),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Password recovery
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RecoverPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyCodeResponse {
    pub message: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub email: Option<String>,
    pub code: Option<String>,
    pub new_password: Option<String>,
}

// ============================================================================
// Registration
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub first_name: String,
    pub email: String,
    pub role_id: i16,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            first_name: user.first_name.to_string(),
            email: user.email.to_string(),
            role_id: user.role.id(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedInResponse {
    pub message: String,
    pub token: String,
    pub expires_at: i64,
    pub user: UserSummary,
}

impl SignedInResponse {
    pub fn new(message: impl Into<String>, signed_in: &SignedInUser) -> Self {
        Self {
            message: message.into(),
            token: signed_in.token.token.clone(),
            expires_at: signed_in.token.expires_at,
            user: UserSummary::from(&signed_in.user),
        }
    }
}

// ============================================================================
// Account maintenance
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role_id: Option<i16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRoleResponse {
    pub message: String,
    pub user: UserSummary,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: UserId,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: Option<String>,
    pub email: String,
    pub role_id: i16,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id,
            first_name: user.first_name.to_string(),
            paternal_surname: user.paternal_surname.to_string(),
            maternal_surname: user.maternal_surname.map(|name| name.to_string()),
            email: user.email.to_string(),
            role_id: user.role.id(),
            role: user.role.code().to_string(),
            created_at: user.created_at,
        }
    }
}
