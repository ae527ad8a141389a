//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod mail;
pub mod postgres;

pub use mail::{LogMailer, MailConfig, Mailer, SmtpMailer};
pub use postgres::PgAuthRepository;
