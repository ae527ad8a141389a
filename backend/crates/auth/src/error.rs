//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::sqlx_error_kind, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Message shared by every code rejection, so a caller cannot tell a
/// never-issued code from an expired one.
const CODE_REJECTED: &str = "Invalid or expired code";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Password rejected by policy or breach check
    #[error("{0}")]
    PasswordRejected(AppError),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Role cannot be chosen at registration")]
    RoleNotAllowed,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("Only administrators may change roles")]
    Forbidden,

    /// No stored code matches the submitted one
    #[error("Verification code does not match")]
    InvalidCode,

    /// The submitted code matched but its window has passed
    #[error("Verification code expired")]
    ExpiredCode,

    /// The password update touched no row
    #[error("Password was not changed")]
    PasswordNotChanged,

    #[error("A token is required for authentication")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Could not send email: {0}")]
    MailDelivery(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_)
            | AuthError::EmailTaken
            | AuthError::RoleNotAllowed
            | AuthError::InvalidCode
            | AuthError::ExpiredCode
            | AuthError::PasswordNotChanged => ErrorKind::BadRequest,
            AuthError::PasswordRejected(err) => err.kind(),
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::InvalidCredentials
            | AuthError::WrongCurrentPassword
            | AuthError::InvalidToken => ErrorKind::Unauthorized,
            AuthError::MissingToken | AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::MailDelivery(_) => ErrorKind::ServiceUnavailable,
            AuthError::Database(e) => match sqlx_error_kind(e) {
                ErrorKind::ServiceUnavailable => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::InternalServerError,
            },
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to the client-facing error. Store and internal details stay out.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::PasswordRejected(err) => {
                let mapped = AppError::new(err.kind(), err.message().to_string());
                match err.action() {
                    Some(action) => mapped.with_action(action.to_string()),
                    None => mapped,
                }
            }
            AuthError::InvalidCode | AuthError::ExpiredCode => {
                AppError::bad_request(CODE_REJECTED).with_action("Request a new code")
            }
            AuthError::MailDelivery(_) => AppError::service_unavailable("Could not send email")
                .with_action("Please try again in a few minutes"),
            AuthError::Database(_) if self.kind().is_retriable() => {
                AppError::service_unavailable("Service temporarily unavailable")
            }
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::MailDelivery(msg) => {
                tracing::error!(message = %msg, "Verification mail delivery failed");
            }
            AuthError::InvalidCode => {
                tracing::warn!(reason = "mismatch", "Verification code rejected");
            }
            AuthError::ExpiredCode => {
                tracing::warn!(reason = "expired", "Verification code rejected");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::WrongCurrentPassword => {
                tracing::warn!("Password change with wrong current password");
            }
            AuthError::InvalidToken => {
                tracing::warn!("Rejected invalid access token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::token::TokenError> for AuthError {
    fn from(err: platform::token::TokenError) -> Self {
        match err {
            platform::token::TokenError::Signing(msg) => AuthError::Internal(msg),
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<crate::domain::entity::verification_code::CodeRejection> for AuthError {
    fn from(rejection: crate::domain::entity::verification_code::CodeRejection) -> Self {
        use crate::domain::entity::verification_code::CodeRejection;
        match rejection {
            CodeRejection::Mismatch => AuthError::InvalidCode,
            CodeRejection::Expired => AuthError::ExpiredCode,
        }
    }
}

/// Value-object failures: client errors keep their message, anything
/// else is internal.
impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.is_server_error() {
            AuthError::Internal(err.message().to_string())
        } else {
            AuthError::Validation(err.message().to_string())
        }
    }
}
