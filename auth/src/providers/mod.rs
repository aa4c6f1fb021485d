//! External collaborators.
//!
//! This module defines traits for the dependencies of the token flows that
//! live outside this crate, plus the production implementations shipped
//! with it.
//!
//! # Architecture
//!
//! Providers are **interfaces**. Policies depend on these traits and the
//! application supplies concrete implementations:
//!
//! - **Testing**: [`crate::mocks`] (in-memory, deterministic)
//! - **Development**: [`ConsoleEmailSender`] (writes emails to stderr)
//! - **Production**: [`SmtpEmailSender`] and an HTTP client for the data API

pub mod console_email;
pub mod email;
pub mod smtp_email;
pub mod user;

pub use console_email::ConsoleEmailSender;
pub use email::{EmailMessage, EmailSender};
pub use smtp_email::SmtpEmailSender;
pub use user::UserDirectory;
