pub mod pending_registration;
pub mod user;
pub mod verification_code;
