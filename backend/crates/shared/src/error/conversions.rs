//! Error conversions
//!
//! Store errors are classified here once so every crate agrees on which
//! failures are retriable. Driver messages stay in `source` and never reach
//! the response body.

#[cfg(feature = "sqlx")]
use super::app_error::AppError;
#[cfg(feature = "sqlx")]
use super::kind::ErrorKind;

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

/// Classify a sqlx error.
///
/// Connection trouble, resource exhaustion, lock timeouts, serialization
/// failures and deadlocks are [`ErrorKind::ServiceUnavailable`]: the
/// transaction was rolled back and the request can be retried as-is.
#[cfg(feature = "sqlx")]
pub fn sqlx_error_kind(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            ErrorKind::ServiceUnavailable
        }
        sqlx::Error::Database(db_err) => {
            // https://www.postgresql.org/docs/current/errcodes-appendix.html
            match db_err.code().as_deref() {
                // Class 23: Integrity Constraint Violation
                Some("23000" | "23001" | "23503" | "23505") => ErrorKind::Conflict,
                Some("23502" | "23514") => ErrorKind::BadRequest,
                // Class 40: Transaction Rollback
                Some("40001" | "40P01") => ErrorKind::ServiceUnavailable,
                // Class 55: lock_not_available (lock_timeout)
                Some("55P03") => ErrorKind::ServiceUnavailable,
                // Class 53: Insufficient Resources, Class 57: Operator Intervention
                Some(code) if code.starts_with("53") || code.starts_with("57") => {
                    ErrorKind::ServiceUnavailable
                }
                _ => ErrorKind::InternalServerError,
            }
        }
        _ => ErrorKind::InternalServerError,
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let message = match sqlx_error_kind(&err) {
            ErrorKind::NotFound => "Record not found",
            ErrorKind::Conflict => "Conflicting record",
            ErrorKind::BadRequest => "Constraint violation",
            ErrorKind::ServiceUnavailable => "Database temporarily unavailable",
            _ => "Database error",
        };
        AppError::new(sqlx_error_kind(&err), message).with_source(err)
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for super::app_error::AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "sqlx"))]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_retriable() {
        let kind = sqlx_error_kind(&sqlx::Error::PoolTimedOut);
        assert_eq!(kind, ErrorKind::ServiceUnavailable);
        assert!(kind.is_retriable());
    }

    #[test]
    fn test_io_error_is_retriable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(
            sqlx_error_kind(&sqlx::Error::Io(io)),
            ErrorKind::ServiceUnavailable
        );
    }

    #[test]
    fn test_row_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_driver_text_not_in_message() {
        let err: AppError = sqlx::Error::Protocol("secret internals".into()).into();
        assert_eq!(err.kind(), ErrorKind::InternalServerError);
        assert_eq!(err.message(), "Database error");
    }
}
