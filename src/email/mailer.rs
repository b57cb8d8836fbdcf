use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::state::EmailConfig;

/// Outbound email seam. Implementations fail loudly (timeout or transport
/// error); callers decide whether the failure is fatal.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, text_body: &str, html_body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    /// Own deadline for a single send; a hung relay must not stall a scan tick.
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = format!("TaskFlow <{}>", config.from)
            .parse()
            .map_err(|e| AppError::Email(format!("invalid from address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Email(format!("smtp relay: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, text_body: &str, html_body: &str) -> Result<()> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::Email(format!("invalid recipient {to}: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text_body.to_string(),
                html_body.to_string(),
            ))
            .map_err(|e| AppError::Email(format!("build message: {e}")))?;

        match tokio::time::timeout(self.timeout, self.transport.send(email)).await {
            Ok(Ok(_)) => {
                tracing::info!("Email sent to: {to}");
                Ok(())
            }
            Ok(Err(e)) => Err(AppError::Email(format!("smtp send: {e}"))),
            Err(_) => Err(AppError::Email(format!(
                "smtp send timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

/// Stands in when SMTP is not configured; the in-app channel still works.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, to: &str, subject: &str, _text: &str, _html: &str) -> Result<()> {
        tracing::debug!("email disabled; skipping send to {to} ({subject})");
        Ok(())
    }
}
