//! SMTP email sender implementation using Lettre.

use crate::config::EmailConfig;
use crate::error::{AuthError, Result};
use crate::providers::{ConsoleEmailSender, EmailMessage, EmailSender};
use crate::utils::hash_email;
use lettre::address::{Address, Envelope};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};

/// SMTP email sender using Lettre.
///
/// Sends real emails via an SMTP relay. When [`EmailConfig::send_to_stderr`]
/// is set, messages are written to stderr instead (see
/// [`ConsoleEmailSender`]), so the same sender can be wired up in every
/// environment.
///
/// # Examples
///
/// ```ignore
/// use dmutils_auth::config::EmailConfig;
/// use dmutils_auth::providers::SmtpEmailSender;
///
/// let sender = SmtpEmailSender::new(
///     "email-smtp.ap-southeast-2.amazonaws.com".to_string(),
///     587,
///     "smtp-user".to_string(),
///     "smtp-password".to_string(),
///     EmailConfig::from_env(),
/// );
/// ```
#[derive(Clone)]
pub struct SmtpEmailSender {
    /// SMTP server address.
    smtp_server: String,

    /// SMTP server port.
    smtp_port: u16,

    /// SMTP credentials.
    credentials: Credentials,

    /// BCC, return path and stderr options.
    config: EmailConfig,
}

impl SmtpEmailSender {
    /// Create a new SMTP email sender.
    #[must_use]
    pub fn new(
        smtp_server: String,
        smtp_port: u16,
        smtp_username: String,
        smtp_password: String,
        config: EmailConfig,
    ) -> Self {
        Self {
            smtp_server,
            smtp_port,
            credentials: Credentials::new(smtp_username, smtp_password),
            config,
        }
    }

    /// Build SMTP transport for sending emails.
    ///
    /// # Errors
    ///
    /// Returns error if the relay address is invalid.
    fn build_transport(&self) -> Result<SmtpTransport> {
        Ok(SmtpTransport::relay(&self.smtp_server)
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }

    /// Build the message, including the SMTP envelope.
    ///
    /// The envelope sender is the bounce address: the configured return
    /// address, else the reply-to address, else the sender. BCC recipients
    /// appear only in the envelope.
    fn build_message(&self, message: &EmailMessage) -> Result<Message> {
        if message.to.is_empty() {
            return Err(AuthError::EmailDeliveryFailed("No recipients".to_string()));
        }

        let from: Mailbox = message
            .from_line()
            .parse()
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Invalid from address: {e}")))?;
        let reply_to: Mailbox = message
            .reply_to_address()
            .parse()
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Invalid reply-to address: {e}")))?;

        let mut recipients = message
            .to
            .iter()
            .map(|to| parse_address(to))
            .collect::<Result<Vec<_>>>()?;
        if let Some(bcc) = &self.config.bcc_address {
            recipients.push(parse_address(bcc)?);
        }

        let return_path = parse_address(
            self.config
                .return_address
                .as_deref()
                .unwrap_or_else(|| message.reply_to_address()),
        )?;
        let envelope = Envelope::new(Some(return_path), recipients.clone())
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Invalid envelope: {e}")))?;

        let mut builder = Message::builder()
            .from(from)
            .reply_to(reply_to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .envelope(envelope);
        for to in recipients.iter().take(message.to.len()) {
            builder = builder.to(Mailbox::new(None, to.clone()));
        }

        builder
            .body(message.body.clone())
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Failed to build email: {e}")))
    }
}

fn parse_address(address: &str) -> Result<Address> {
    address
        .parse()
        .map_err(|e| AuthError::EmailDeliveryFailed(format!("Invalid address '{address}': {e}")))
}

impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<Option<String>> {
        if self.config.send_to_stderr {
            return ConsoleEmailSender::new().send_email(message).await;
        }

        let email = self.build_message(message)?;
        let mailer = self.build_transport()?;

        let response = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Email task failed: {e}")))?
            .map_err(|e| {
                error!(error = %e, "An SMTP error occurred");
                AuthError::EmailDeliveryFailed(e.to_string())
            })?;

        let id = response.first_line().map(ToString::to_string);
        info!(
            id = ?id,
            email_hash = %message.to.first().map(|to| hash_email(to)).unwrap_or_default(),
            "Sent email"
        );

        Ok(id)
    }
}
