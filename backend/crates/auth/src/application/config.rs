//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::crypto::random_bytes;
use platform::token::TokenService;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens
    pub token_secret: Vec<u8>,
    /// Access token lifetime (24 hours)
    pub token_ttl: Duration,
    /// Password recovery code window (30 minutes)
    pub recovery_code_ttl: Duration,
    /// Registration code window (60 minutes)
    pub registration_code_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Reject passwords found by the HIBP range lookup
    pub check_breached_passwords: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: Vec::new(),
            token_ttl: Duration::from_secs(24 * 3600),
            recovery_code_ttl: Duration::from_secs(30 * 60),
            registration_code_ttl: Duration::from_secs(60 * 60),
            password_pepper: None,
            check_breached_passwords: false,
        }
    }
}

impl AuthConfig {
    /// Create config for development (random token secret; tokens do not
    /// survive a restart)
    pub fn development() -> Self {
        Self {
            token_secret: random_bytes(32),
            ..Default::default()
        }
    }

    pub fn token_service(&self) -> TokenService {
        TokenService::new(&self.token_secret, self.token_ttl)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn recovery_code_ttl(&self) -> chrono::Duration {
        to_chrono(self.recovery_code_ttl)
    }

    pub fn registration_code_ttl(&self) -> chrono::Duration {
        to_chrono(self.registration_code_ttl)
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let config = AuthConfig::default();
        assert_eq!(config.recovery_code_ttl(), chrono::Duration::minutes(30));
        assert_eq!(config.registration_code_ttl(), chrono::Duration::minutes(60));
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn test_development_secret_is_random() {
        let a = AuthConfig::development();
        let b = AuthConfig::development();
        assert_eq!(a.token_secret.len(), 32);
        assert_ne!(a.token_secret, b.token_secret);
    }
}
