//! Token policy environment.
//!
//! This module defines the environment type for dependency injection
//! into the token policies.

use crate::providers::{EmailSender, UserDirectory};
use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Token policy environment.
///
/// Contains the external dependencies needed by the token flows.
///
/// # Type Parameters
///
/// - `U`: User directory
/// - `E`: Email sender
/// - `C`: Clock
#[derive(Clone)]
pub struct AuthEnvironment<U, E, C = SystemClock>
where
    U: UserDirectory,
    E: EmailSender,
    C: Clock,
{
    /// User directory (data API).
    pub users: U,

    /// Email sender.
    pub email: E,

    /// Clock used for token issuance and expiry.
    pub clock: C,
}

impl<U, E> AuthEnvironment<U, E, SystemClock>
where
    U: UserDirectory,
    E: EmailSender,
{
    /// Create a new environment using the system clock.
    #[must_use]
    pub const fn new(users: U, email: E) -> Self {
        Self {
            users,
            email,
            clock: SystemClock,
        }
    }
}

impl<U, E, C> AuthEnvironment<U, E, C>
where
    U: UserDirectory,
    E: EmailSender,
    C: Clock,
{
    /// Replace the clock.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> AuthEnvironment<U, E, C2> {
        AuthEnvironment {
            users: self.users,
            email: self.email,
            clock,
        }
    }
}
