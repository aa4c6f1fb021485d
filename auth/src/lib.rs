//! # Digital Marketplace account tokens
//!
//! Stateless, encrypted, purpose-bound tokens for the emails a marketplace
//! sends to its users: password resets and invitations.
//!
//! ## Features
//!
//! - **Encrypted**: AES-256-GCM; payloads are confidential and tamper-evident
//! - **Purpose-bound**: a token minted for one flow is rejected by every other
//! - **Stateless**: no token registry; expiry and account state do the revoking
//! - **Oracle-free**: users see one `"token_invalid"`, logs see the real reason
//! - **Testable**: collaborators are traits with in-memory mocks
//!
//! ## Architecture
//!
//! ```text
//! token (codec) → policy::{password_reset, invitation} → providers (directory, email)
//! ```
//!
//! ## Example: Password reset
//!
//! ```rust,ignore
//! use dmutils_auth::*;
//!
//! let config = TokenConfig::from_env()?;
//! let policy = PasswordResetPolicy::from_config(&config);
//!
//! // 1. Mint a token and email it
//! let token = policy.generate_token(&user, &env.clock)?;
//!
//! // 2. User follows the link
//! match decode_password_reset_token(&token, &config, &env).await {
//!     Ok(payload) => { /* show the new-password form for payload["user"] */ }
//!     Err(code) => { /* code == "token_invalid" */ }
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

// Public modules
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod logging;
pub mod policy;
pub mod providers;
pub mod token;
pub mod user;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use config::{EmailConfig, LogConfig, TokenConfig};
pub use environment::{AuthEnvironment, Clock, SystemClock};
pub use error::{AuthError, ErrorKind, Result, TokenError, TOKEN_INVALID};
pub use policy::{
    decode_invitation_token, decode_password_reset_token, InvitationPolicy, PasswordResetPolicy,
};
pub use token::{decode, encode, extract_creation_timestamp, Payload, SecretKey};
pub use user::User;
