//! Email delivery trait.

use crate::error::Result;
use std::future::Future;

/// An outgoing HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient addresses.
    pub to: Vec<String>,

    /// Subject line.
    pub subject: String,

    /// Rendered HTML body.
    pub body: String,

    /// Sender address.
    pub from_email: String,

    /// Sender display name.
    pub from_name: String,

    /// Reply-to address; defaults to the sender.
    pub reply_to: Option<String>,
}

impl EmailMessage {
    /// Create a new message without a reply-to address.
    #[must_use]
    pub fn new<I, S>(
        to: I,
        subject: impl Into<String>,
        body: impl Into<String>,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            to: to.into_iter().map(Into::into).collect(),
            subject: subject.into(),
            body: body.into(),
            from_email: from_email.into(),
            from_name: from_name.into(),
            reply_to: None,
        }
    }

    /// Set the reply-to address.
    #[must_use]
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// `Name <address>` form of the sender.
    #[must_use]
    pub fn from_line(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Address replies should go to.
    #[must_use]
    pub fn reply_to_address(&self) -> &str {
        self.reply_to.as_deref().unwrap_or(&self.from_email)
    }
}

/// Email delivery service.
///
/// This trait abstracts over email delivery backends (SMTP relay, console
/// output for development, in-memory mocks for tests).
pub trait EmailSender: Send + Sync {
    /// Send an email.
    ///
    /// # Returns
    ///
    /// The provider's message id, when it reports one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::EmailDeliveryFailed`] if:
    /// - The message has no recipients or an address is invalid
    /// - The provider rejects the message
    /// - The network request fails
    fn send_email(
        &self,
        message: &EmailMessage,
    ) -> impl Future<Output = Result<Option<String>>> + Send;
}
