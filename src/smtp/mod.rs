//! Outbound mail transport.
//!
//! [`Mailer`] is the seam the dispatch routine and the account flows send
//! through. [`SmtpMailer`] talks to a real relay via lettre; [`LogMailer`]
//! only writes the message to the log and is used when no SMTP host is
//! configured.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Config, SmtpConfig};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("{0}")]
    Smtp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Either completes or returns a transport-level error; there is no
/// soft-bounce distinction.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, MailError> {
        // 465 is implicit TLS, everything else negotiates STARTTLS
        let builder = if cfg.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
        }
        .map_err(|e| MailError::Smtp(e.to_string()))?
        .port(cfg.port);

        let builder = match (&cfg.username, &cfg.password) {
            (Some(user), Some(pass)) => {
                // Trim whitespace that may sneak in from copied app passwords
                let clean: String = pass.chars().filter(|c| !c.is_whitespace()).collect();
                builder.credentials(Credentials::new(user.trim().to_string(), clean))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
        })
    }
}

pub fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
    let from: Mailbox = email
        .from
        .parse()
        .map_err(|_| MailError::InvalidAddress(email.from.clone()))?;
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;
        Ok(())
    }
}

/// Development transport: validates the message and logs it instead of sending.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        build_message(email)?;
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "mail (log transport): {}",
            email.body
        );
        Ok(())
    }
}

pub fn mailer_from_config(cfg: &Config) -> Result<Arc<dyn Mailer>, MailError> {
    match &cfg.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "using SMTP transport");
            Ok(Arc::new(SmtpMailer::new(smtp)?))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, outbound mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_message_rejects_bad_recipient() {
        let email = OutgoingEmail::new("sender@example.com", "not-an-address", "Hi", "Body");
        match build_message(&email) {
            Err(MailError::InvalidAddress(addr)) => assert_eq!(addr, "not-an-address"),
            other => panic!("expected invalid address, got {other:?}"),
        }
    }

    #[test]
    fn build_message_carries_subject() {
        let email = OutgoingEmail::new("sender@example.com", "r@example.com", "Spring sale", "Body");
        let msg = build_message(&email).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("Subject: Spring sale"));
        assert!(raw.contains("To: r@example.com"));
    }

    #[tokio::test]
    async fn log_mailer_accepts_valid_mail() {
        let email = OutgoingEmail::new("sender@example.com", "r@example.com", "Hi", "Body");
        LogMailer.send(&email).await.unwrap();
    }
}
