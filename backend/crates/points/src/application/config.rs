//! Application Configuration
//!
//! Configuration for the points application layer.

use std::time::Duration;

/// Points application configuration
#[derive(Debug, Clone)]
pub struct PointsConfig {
    /// Longest a ledger transaction waits for a lock before giving up (503)
    pub lock_timeout: Duration,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
        }
    }
}

impl PointsConfig {
    /// `lock_timeout` in the form Postgres' `SET lock_timeout` accepts.
    pub fn lock_timeout_setting(&self) -> String {
        format!("{}ms", self.lock_timeout.as_millis().max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lock_timeout() {
        let config = PointsConfig::default();
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.lock_timeout_setting(), "5000ms");
    }

    #[test]
    fn test_zero_timeout_is_not_unbounded() {
        // Postgres reads 0 as "wait forever".
        let config = PointsConfig {
            lock_timeout: Duration::ZERO,
        };
        assert_eq!(config.lock_timeout_setting(), "1ms");
    }
}
