//! Mail delivery for verification codes.
//!
//! `SmtpMailer` talks to a STARTTLS relay; `LogMailer` only writes the code
//! to the log and is meant for local development.

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::domain::mailer::{CodeMailer, CodeMessage};
use crate::error::{AuthError, AuthResult};

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// `Name <address>` or a bare address
    pub from: String,
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> AuthResult<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Internal(format!("Invalid sender address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AuthError::Internal(format!("Failed to create SMTP transport: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, to: &str, subject: &str, body: String) -> AuthResult<Message> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| AuthError::MailDelivery(format!("Invalid recipient: {}", e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AuthError::Internal(format!("Failed to build message: {}", e)))
    }

    async fn deliver(&self, message: Message) -> AuthResult<()> {
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| AuthError::MailDelivery(e.to_string()))
    }
}

impl CodeMailer for SmtpMailer {
    async fn send_recovery_code(&self, message: &CodeMessage) -> AuthResult<()> {
        let body = recovery_body(message);
        let mail = self.build_message(
            message.to.as_str(),
            "Código de recuperación de contraseña",
            body,
        )?;
        self.deliver(mail).await
    }

    async fn send_registration_code(&self, message: &CodeMessage) -> AuthResult<()> {
        let body = registration_body(message);
        let mail = self.build_message(message.to.as_str(), "Verifica tu correo electrónico", body)?;
        self.deliver(mail).await
    }
}

fn recovery_body(message: &CodeMessage) -> String {
    format!(
        "Hola {},\n\n\
         Tu código para restablecer la contraseña es: {}\n\n\
         El código vence en {} minutos. Si no solicitaste el cambio, ignora este mensaje.\n",
        message.recipient_name,
        message.code.as_str(),
        message.valid_for_minutes
    )
}

fn registration_body(message: &CodeMessage) -> String {
    format!(
        "Hola {},\n\n\
         Tu código de verificación es: {}\n\n\
         Ingrésalo en los próximos {} minutos para activar tu cuenta.\n",
        message.recipient_name,
        message.code.as_str(),
        message.valid_for_minutes
    )
}

/// Development mailer: the code goes to the log instead of an inbox.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl CodeMailer for LogMailer {
    async fn send_recovery_code(&self, message: &CodeMessage) -> AuthResult<()> {
        tracing::info!(
            to = %message.to,
            code = message.code.as_str(),
            valid_for_minutes = message.valid_for_minutes,
            "Recovery code (log mailer)"
        );
        Ok(())
    }

    async fn send_registration_code(&self, message: &CodeMessage) -> AuthResult<()> {
        tracing::info!(
            to = %message.to,
            code = message.code.as_str(),
            valid_for_minutes = message.valid_for_minutes,
            "Registration code (log mailer)"
        );
        Ok(())
    }
}

/// The mailer picked at startup.
#[derive(Clone)]
pub enum Mailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl Mailer {
    /// SMTP when configured, otherwise the log mailer.
    pub fn from_config(config: Option<&MailConfig>) -> AuthResult<Self> {
        match config {
            Some(config) => Ok(Mailer::Smtp(SmtpMailer::new(config)?)),
            None => {
                tracing::warn!("SMTP not configured; verification codes will only be logged");
                Ok(Mailer::Log(LogMailer))
            }
        }
    }
}

impl CodeMailer for Mailer {
    async fn send_recovery_code(&self, message: &CodeMessage) -> AuthResult<()> {
        match self {
            Mailer::Smtp(mailer) => mailer.send_recovery_code(message).await,
            Mailer::Log(mailer) => mailer.send_recovery_code(message).await,
        }
    }

    async fn send_registration_code(&self, message: &CodeMessage) -> AuthResult<()> {
        match self {
            Mailer::Smtp(mailer) => mailer.send_registration_code(message).await,
            Mailer::Log(mailer) => mailer.send_registration_code(message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{email::Email, one_time_code::OneTimeCode};

    fn message() -> CodeMessage {
        CodeMessage {
            to: Email::from_db("ana@example.com"),
            recipient_name: "Ana".to_string(),
            code: OneTimeCode::from_db("042917"),
            valid_for_minutes: 30,
        }
    }

    #[test]
    fn test_bodies_carry_code_and_window() {
        let body = recovery_body(&message());
        assert!(body.contains("042917"));
        assert!(body.contains("30 minutos"));
        assert!(body.starts_with("Hola Ana"));

        let body = registration_body(&message());
        assert!(body.contains("042917"));
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = Mailer::from_config(None).unwrap();
        assert!(mailer.send_recovery_code(&message()).await.is_ok());
        assert!(mailer.send_registration_code(&message()).await.is_ok());
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let config = MailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "user".to_string(),
            password: "pass".to_string(),
            from: "not an address".to_string(),
        };
        assert!(matches!(SmtpMailer::new(&config), Err(AuthError::Internal(_))));
    }
}
