//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all provider traits
//! for use in unit and integration tests.

pub mod clock;
pub mod email;
pub mod user;

pub use clock::FixedClock;
pub use email::MockEmailSender;
pub use user::MockUserDirectory;
