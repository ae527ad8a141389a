//! Server configuration from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::{AuthConfig, MailConfig};
use points::PointsConfig;

const DEFAULT_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    /// `None` means codes are written to the log instead of mailed.
    pub mail: Option<MailConfig>,
    pub points: PointsConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let database_max_connections = parse_or(&var, "DATABASE_MAX_CONNECTIONS", 5)?;
        let bind_addr = parse_or(&var, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;

        let frontend_origins = var("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let mut auth = match var("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => AuthConfig {
                token_secret: secret.into_bytes(),
                ..AuthConfig::default()
            },
            _ if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using a random secret");
                AuthConfig::development()
            }
            _ => bail!("JWT_SECRET must be set in production"),
        };
        auth.password_pepper = var("PASSWORD_PEPPER")
            .filter(|pepper| !pepper.is_empty())
            .map(String::into_bytes);
        auth.check_breached_passwords = parse_or(&var, "CHECK_BREACHED_PASSWORDS", false)?;

        let mail = match var("SMTP_HOST") {
            Some(smtp_host) if !smtp_host.is_empty() => {
                let username = var("SMTP_USERNAME").unwrap_or_default();
                Some(MailConfig {
                    smtp_host,
                    smtp_port: parse_or(&var, "SMTP_PORT", 587)?,
                    password: var("SMTP_PASSWORD").unwrap_or_default(),
                    from: var("MAIL_FROM").unwrap_or_else(|| username.clone()),
                    username,
                })
            }
            _ => None,
        };

        let lock_timeout_ms: u64 = parse_or(&var, "LEDGER_LOCK_TIMEOUT_MS", 5000)?;
        let points = PointsConfig {
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            bind_addr,
            frontend_origins,
            auth,
            mail,
            points,
        })
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        _ => Ok(default),
    }
}
