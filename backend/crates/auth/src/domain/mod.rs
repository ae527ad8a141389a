//! Domain Layer
//!
//! Entities, value objects, repository traits and the mail port.

pub mod entity;
pub mod mailer;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    pending_registration::PendingRegistration,
    user::User,
    verification_code::{CodePurpose, EmailRegistration, PasswordRecovery, VerificationCode},
};
pub use mailer::{CodeMailer, CodeMessage};
pub use repository::{AuthStore, UserRepository, VerificationCodeRepository};
