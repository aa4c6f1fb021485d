//! Console email sender for development and testing.

use crate::error::Result;
use crate::providers::{EmailMessage, EmailSender};
use crate::utils::hash_email;
use tracing::info;

/// Console email sender.
///
/// Writes emails to stderr instead of sending them. Useful for development
/// where you don't want to send real emails.
///
/// # Examples
///
/// ```ignore
/// use dmutils_auth::providers::{ConsoleEmailSender, EmailMessage, EmailSender};
///
/// let message = EmailMessage::new(
///     ["user@example.com"],
///     "Reset your password",
///     "<a href=\"https://example.com/reset/abc\">Reset</a>",
///     "no-reply@example.com",
///     "Example",
/// );
/// ConsoleEmailSender::new().send_email(&message).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    /// Create a new console email sender.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Render a message the way it is written to stderr.
    #[must_use]
    pub fn render(message: &EmailMessage) -> String {
        format!(
            "To: {to}\nSubject: {subject}\nFrom: {from}\nReply-To: {reply_to}\n\n{body}",
            to = message.to.join(", "),
            subject = message.subject,
            from = message.from_line(),
            reply_to = message.reply_to.as_deref().unwrap_or_default(),
            body = message.body,
        )
    }
}

impl EmailSender for ConsoleEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<Option<String>> {
        info!(
            recipients = message.to.len(),
            email_hash = %message.to.first().map(|to| hash_email(to)).unwrap_or_default(),
            "📧 Email written to stderr (Development Mode)"
        );
        eprintln!("{}", Self::render(message));

        Ok(None)
    }
}
