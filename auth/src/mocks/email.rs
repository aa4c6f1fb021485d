//! Mock email sender for testing.

use crate::error::{AuthError, Result};
use crate::providers::{EmailMessage, EmailSender};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock email sender.
///
/// Records messages instead of delivering them.
#[derive(Debug, Clone)]
pub struct MockEmailSender {
    /// Whether to simulate success or failure.
    pub should_succeed: bool,
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MockEmailSender {
    /// Create a new mock email sender that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            should_succeed: true,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock email sender whose deliveries all fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_succeed: false,
            ..Self::new()
        }
    }

    /// Messages delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Default for MockEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailSender for MockEmailSender {
    fn send_email(
        &self,
        message: &EmailMessage,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        let sent = Arc::clone(&self.sent);
        let should_succeed = self.should_succeed;
        let message = message.clone();

        async move {
            if !should_succeed {
                return Err(AuthError::EmailDeliveryFailed(
                    "simulated delivery failure".to_string(),
                ));
            }

            let mut sent = sent
                .lock()
                .map_err(|_| AuthError::Internal("lock poisoned".to_string()))?;
            sent.push(message);
            Ok(Some(format!("mock-{}", sent.len())))
        }
    }
}
