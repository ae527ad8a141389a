//! Application Layer
//!
//! Use cases and application services.

pub mod account;
pub mod authenticate;
pub mod code_lifecycle;
pub mod config;
pub mod housekeeping;
pub mod login;
mod password;
pub mod profile;
pub mod recover_password;
pub mod register;

// Re-exports
pub use account::{UpdatePasswordInput, UpdatePasswordUseCase, UpdateRoleUseCase};
pub use authenticate::{AuthenticatedUser, authenticate};
pub use config::AuthConfig;
pub use housekeeping::{PurgeReport, purge_expired_codes};
pub use login::{LoginUseCase, SignedInUser};
pub use profile::GetProfileUseCase;
pub use recover_password::{
    ChangePasswordInput, ChangePasswordUseCase, RequestPasswordRecoveryUseCase,
    VerifyRecoveryCodeUseCase,
};
pub use register::{RegisterInput, RegisterUseCase, VerifyEmailUseCase};
