//! Invitation token policy.
//!
//! Invitation tokens are minted by one application and redeemed by another,
//! so they use the shared email key rather than the application secret.
//! They stay valid for seven days by default.
//!
//! The payload must contain the fields required for the invitee's role:
//! supplier invitations carry the supplier code and name alongside the
//! email address; every other role needs only the email address.

use crate::config::TokenConfig;
use crate::constants::{fields, roles};
use crate::environment::Clock;
use crate::error::{AuthError, Result};
use crate::token::{self, Payload, SecretKey};
use crate::utils::token_prefix;
use chrono::Duration;
use serde::Serialize;
use tracing::info;

const SUPPLIER_FIELDS: &[&str] = &[
    fields::EMAIL_ADDRESS,
    fields::SUPPLIER_CODE,
    fields::SUPPLIER_NAME,
];
const DEFAULT_FIELDS: &[&str] = &[fields::EMAIL_ADDRESS];

/// Payload fields an invitation for `role` must carry.
///
/// # Examples
///
/// ```
/// use dmutils_auth::policy::required_fields;
///
/// assert_eq!(required_fields("buyer"), ["email_address"]);
/// assert_eq!(
///     required_fields("supplier"),
///     ["email_address", "supplier_code", "supplier_name"]
/// );
/// ```
#[must_use]
pub fn required_fields(role: &str) -> &'static [&'static str] {
    if role == roles::SUPPLIER {
        SUPPLIER_FIELDS
    } else {
        DEFAULT_FIELDS
    }
}

/// Invitation token policy.
#[derive(Debug, Clone)]
pub struct InvitationPolicy {
    shared_key: SecretKey,
    salt: String,
    max_age: Duration,
}

impl InvitationPolicy {
    /// Create a policy with an explicit key, salt and maximum age.
    #[must_use]
    pub const fn new(shared_key: SecretKey, salt: String, max_age: Duration) -> Self {
        Self {
            shared_key,
            salt,
            max_age,
        }
    }

    /// Create a policy from the application's token configuration.
    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(
            config.shared_email_key.clone(),
            config.invite_email_salt.clone(),
            config.invitation_max_age,
        )
    }

    /// Maximum token age.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Mint an invitation token, issued at the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns error if `payload` is not a JSON object or the configured
    /// salt is invalid.
    pub fn generate_token<T, C>(&self, payload: &T, clock: &C) -> Result<String>
    where
        T: Serialize + ?Sized,
        C: Clock,
    {
        Ok(token::encode_at(
            payload,
            &self.shared_key,
            &self.salt,
            clock.now(),
        )?)
    }

    /// Decode an invitation token for an invitee with `role`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Token`]: invalid, expired or wrong-purpose token
    /// - [`AuthError::MissingFields`]: payload lacks fields required for `role`
    pub fn decode_with_policy<C: Clock>(&self, token: &str, role: &str, clock: &C) -> Result<Payload> {
        let payload = token::decode_at(
            token,
            &self.shared_key,
            &self.salt,
            self.max_age,
            clock.now(),
        )?;

        let missing: Vec<String> = required_fields(role)
            .iter()
            .filter(|field| !payload.contains_key(**field))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AuthError::MissingFields { missing });
        }

        Ok(payload)
    }

    /// Decode an invitation token, returning `None` on any failure.
    ///
    /// The reason is logged for diagnostics only.
    #[must_use]
    pub fn decode_invitation_token<C: Clock>(&self, token: &str, role: &str, clock: &C) -> Option<Payload> {
        match self.decode_with_policy(token, role, clock) {
            Ok(payload) => Some(payload),
            Err(e) => {
                info!(
                    token = %token_prefix(token),
                    role = %role,
                    kind = ?e.kind(),
                    reason = %e,
                    "Invalid invitation token"
                );
                None
            }
        }
    }
}

/// Decode an invitation token with the configured shared key and salt.
///
/// Any failure, including missing fields, yields `None`.
#[must_use]
pub fn decode_invitation_token<C: Clock>(
    token: &str,
    role: &str,
    config: &TokenConfig,
    clock: &C,
) -> Option<Payload> {
    InvitationPolicy::from_config(config).decode_invitation_token(token, role, clock)
}
