//! Warning e-mails for flagged tickers.
//!
//! [`Notifier`] composes the message and hands it to a [`MailTransport`].
//! Delivery failures are logged and swallowed: a broken mail server must not
//! fail a pipeline run whose spreadsheet is already written.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use finrisk_core::SmtpSettings;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::error::NotifyError;

pub const WARNING_SUBJECT: &str = "Warning! Higher probability!";

pub type MailFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// A plain-text message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers composed messages.
pub trait MailTransport: Send + Sync {
    fn send<'a>(&'a self, message: &'a MailMessage) -> MailFuture<'a>;
}

/// What [`Notifier::send_warning`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// No tickers were flagged.
    Skipped,
    Sent,
    /// The transport failed; the error has been logged.
    Failed,
}

#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    sender: String,
    receiver: String,
}

impl Notifier {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }

    pub fn from_settings(transport: Arc<dyn MailTransport>, settings: &SmtpSettings) -> Self {
        Self::new(transport, settings.sender.clone(), settings.receiver.clone())
    }

    pub fn warning_message(&self, tickers: &[String]) -> MailMessage {
        MailMessage {
            from: self.sender.clone(),
            to: self.receiver.clone(),
            subject: WARNING_SUBJECT.to_owned(),
            body: format!(
                "Probability has increased for companies: {}.",
                tickers.join(", ")
            ),
        }
    }

    /// Sends one message naming every ticker; nothing is sent for an empty list.
    pub async fn send_warning(&self, tickers: &[String]) -> Delivery {
        if tickers.is_empty() {
            return Delivery::Skipped;
        }
        let message = self.warning_message(tickers);
        match self.transport.send(&message).await {
            Ok(()) => {
                info!(receiver = %self.receiver, tickers = tickers.len(), "warning e-mail sent");
                Delivery::Sent
            }
            Err(error) => {
                error!(receiver = %self.receiver, %error, "failed to send warning e-mail");
                Delivery::Failed
            }
        }
    }
}

/// STARTTLS SMTP relay with credential authentication.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings, password: String) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)?
            .port(settings.port)
            .credentials(Credentials::new(settings.sender.clone(), password))
            .build();
        Ok(Self { transport })
    }

    /// Reads the password from `FINRISK_SMTP_PASSWORD`.
    pub fn from_env(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let password = SmtpSettings::password_from_env().ok_or(NotifyError::MissingPassword {
            var: finrisk_core::SMTP_PASSWORD_ENV,
        })?;
        Self::new(settings, password)
    }
}

impl MailTransport for SmtpMailer {
    fn send<'a>(&'a self, message: &'a MailMessage) -> MailFuture<'a> {
        Box::pin(async move {
            let email = Message::builder()
                .from(message.from.parse::<Mailbox>()?)
                .to(message.to.parse::<Mailbox>()?)
                .subject(message.subject.as_str())
                .header(ContentType::TEXT_PLAIN)
                .body(message.body.clone())?;
            let response = self.transport.send(email).await?;
            if response.is_positive() {
                Ok(())
            } else {
                Err(NotifyError::Rejected(format!("{:?}", response.code())))
            }
        })
    }
}

/// Logs instead of sending; used when no SMTP password is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn send<'a>(&'a self, message: &'a MailMessage) -> MailFuture<'a> {
        Box::pin(async move {
            info!(to = %message.to, subject = %message.subject, body = %message.body, "mail not sent (no SMTP credentials)");
            Ok(())
        })
    }
}
