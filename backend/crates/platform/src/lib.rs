//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no marketplace vocabulary:
//! - Random one-time codes and constant-time comparison
//! - Password hashing (Argon2id, NIST SP 800-63B policy)
//! - Signed access tokens (JWT, HS256) and their header extraction

pub mod crypto;
pub mod password;
pub mod token;
