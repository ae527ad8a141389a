//! Points Error Types
//!
//! Ledger-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::sqlx_error_kind, kind::ErrorKind};
use kernel::id::{PromotionId, RoomId, UserId};
use thiserror::Error;

/// Points-specific result type alias
pub type PointsResult<T> = Result<T, PointsError>;

#[derive(Debug, Error)]
pub enum PointsError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Plan not found")]
    PlanNotFound,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Promotion not found")]
    PromotionNotFound,

    #[error("Insufficient points: balance {balance}, required {required}")]
    InsufficientPoints { balance: i64, required: i64 },

    #[error("Promotion is already finalized")]
    AlreadyFinalized,

    /// A status change the state machine does not allow
    #[error("Cannot change promotion status from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("You are not allowed to act on this resource")]
    Forbidden,

    /// Store state that the ledger rules say cannot exist
    #[error("Ledger invariant violated for user {user_id}, room {room_id}: {detail}")]
    InvariantViolation {
        user_id: UserId,
        room_id: RoomId,
        detail: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PointsError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PointsError::Validation(_)
            | PointsError::InsufficientPoints { .. }
            | PointsError::AlreadyFinalized
            | PointsError::InvalidTransition { .. } => ErrorKind::BadRequest,
            PointsError::UserNotFound
            | PointsError::PlanNotFound
            | PointsError::RoomNotFound
            | PointsError::PromotionNotFound => ErrorKind::NotFound,
            PointsError::Forbidden => ErrorKind::Forbidden,
            PointsError::Database(e) => match sqlx_error_kind(e) {
                ErrorKind::ServiceUnavailable => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::InternalServerError,
            },
            PointsError::InvariantViolation { .. } | PointsError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to the client-facing error. Store and invariant details stay out.
    pub fn to_app_error(&self) -> AppError {
        match self {
            PointsError::InsufficientPoints { balance, required } => AppError::bad_request(
                format!("Insufficient points: you have {balance}, the plan costs {required}"),
            )
            .with_action("Recharge points before promoting"),
            PointsError::Database(_) if self.kind().is_retriable() => {
                AppError::service_unavailable("Service temporarily unavailable")
                    .with_action("Please retry the request")
            }
            PointsError::Database(_)
            | PointsError::InvariantViolation { .. }
            | PointsError::Internal(_) => AppError::internal("Internal server error"),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            PointsError::Database(e) => {
                tracing::error!(error = %e, "Points database error");
            }
            PointsError::InvariantViolation {
                user_id,
                room_id,
                detail,
            } => {
                tracing::error!(%user_id, %room_id, detail = %detail, "Ledger invariant violated");
            }
            PointsError::Internal(msg) => {
                tracing::error!(message = %msg, "Points internal error");
            }
            PointsError::Forbidden => {
                tracing::warn!("Rejected cross-user ledger access");
            }
            _ => {
                tracing::debug!(error = %self, "Points error");
            }
        }
    }

    pub(crate) fn two_active(user_id: UserId, room_id: RoomId, ids: &[PromotionId]) -> Self {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        PointsError::InvariantViolation {
            user_id,
            room_id,
            detail: format!("{} active promotions: {}", ids.len(), ids.join(", ")),
        }
    }
}

impl IntoResponse for PointsError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
