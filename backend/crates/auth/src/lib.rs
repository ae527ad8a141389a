//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, mail port
//! - `application/` - Use cases and application services
//! - `infra/` - Database and SMTP implementations
//! - `presentation/` - HTTP handlers, DTOs, router, bearer gate
//!
//! ## Features
//! - Email-verified registration (pending registration + 6-digit code)
//! - Password recovery by mailed code
//! - Login with JWT access tokens
//! - Roles: Tenant, Partner, Admin (admins change roles)
//! - Password change by recovery code or by current password
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Codes compared in constant time; invalid and expired codes look the
//!   same to clients
//! - A code is cleared only after the flow it unlocks has committed

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::authenticate::AuthenticatedUser;
pub use application::config::AuthConfig;
pub use application::housekeeping::purge_expired_codes;
pub use domain::value_object::user_role::UserRole;
pub use error::{AuthError, AuthResult};
pub use infra::{mail::MailConfig, mail::Mailer, postgres::PgAuthRepository};
pub use presentation::middleware::{BearerGate, require_bearer};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
