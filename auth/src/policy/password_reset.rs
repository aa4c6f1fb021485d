//! Password reset token policy.
//!
//! # Flow
//!
//! 1. User requests a reset; [`PasswordResetPolicy::generate_token`] mints a
//!    token carrying the user id and email address
//! 2. [`PasswordResetPolicy::send_reset_email`] emails it as part of a link
//! 3. User follows the link; the token is decoded (key, purpose, one day max age)
//! 4. The user is fetched from the directory
//! 5. The token is rejected if it was issued before the password last changed
//!
//! # Security
//!
//! - Tokens are stateless; step 5 makes them effectively single-use, since
//!   using one changes the password
//! - Every rejection is reported to the user as `"token_invalid"`; the
//!   specific reason is only logged

use crate::config::TokenConfig;
use crate::constants::fields;
use crate::environment::{AuthEnvironment, Clock};
use crate::error::{AuthError, Result};
use crate::providers::{EmailMessage, EmailSender, UserDirectory};
use crate::token::{self, Payload, SecretKey};
use crate::user::{user_logging_string, User};
use crate::utils::token_prefix;
use chrono::Duration;
use serde_json::{json, Value};
use tracing::info;

/// Password reset token policy.
#[derive(Debug, Clone)]
pub struct PasswordResetPolicy {
    secret_key: SecretKey,
    salt: String,
    max_age: Duration,
}

impl PasswordResetPolicy {
    /// Create a policy with an explicit key, salt and maximum age.
    #[must_use]
    pub const fn new(secret_key: SecretKey, salt: String, max_age: Duration) -> Self {
        Self {
            secret_key,
            salt,
            max_age,
        }
    }

    /// Create a policy from the application's token configuration.
    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(
            config.secret_key.clone(),
            config.reset_password_salt.clone(),
            config.password_reset_max_age,
        )
    }

    /// Maximum token age.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Mint a reset token for `user`, issued at the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns error if the configured salt is invalid.
    pub fn generate_token<C: Clock>(&self, user: &User, clock: &C) -> Result<String> {
        let payload = json!({
            fields::USER: user.id,
            fields::EMAIL: user.email_address,
        });
        Ok(token::encode_at(
            &payload,
            &self.secret_key,
            &self.salt,
            clock.now(),
        )?)
    }

    /// Mint a reset token for `user` and email it through the environment's sender.
    ///
    /// `compose` turns the token into the message, typically by embedding it
    /// in a link.
    ///
    /// # Returns
    ///
    /// The provider's message id, when it reports one.
    ///
    /// # Errors
    ///
    /// Returns error if the token cannot be minted or delivery fails.
    pub async fn send_reset_email<U, E, C, F>(
        &self,
        user: &User,
        env: &AuthEnvironment<U, E, C>,
        compose: F,
    ) -> Result<Option<String>>
    where
        U: UserDirectory,
        E: EmailSender,
        C: Clock,
        F: FnOnce(&str) -> EmailMessage,
    {
        let token = self.generate_token(user, &env.clock)?;
        let message = compose(&token);

        let id = env.email.send_email(&message).await?;
        info!(
            user = %user_logging_string(Some(user)),
            "Sent password reset email"
        );

        Ok(id)
    }

    /// Decode a reset token and check it against the user's last password change.
    ///
    /// Rejections are logged with their specific reason.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Token`]: invalid, expired or wrong-purpose token
    /// - [`AuthError::InvalidField`]: payload lacks an integer `user`
    /// - [`AuthError::UserNotFound`]: no such user in the directory
    /// - [`AuthError::PreconditionStale`]: password changed after issuance
    /// - [`AuthError::Directory`]: the lookup itself failed
    pub async fn decode_with_policy<U, E, C>(
        &self,
        token: &str,
        env: &AuthEnvironment<U, E, C>,
    ) -> Result<Payload>
    where
        U: UserDirectory,
        E: EmailSender,
        C: Clock,
    {
        let result = self.check(token, env).await;

        if let Err(e) = &result {
            info!(
                token = %token_prefix(token),
                kind = ?e.kind(),
                reason = %e,
                "Invalid password reset token"
            );
        }

        result
    }

    async fn check<U, E, C>(&self, token: &str, env: &AuthEnvironment<U, E, C>) -> Result<Payload>
    where
        U: UserDirectory,
        E: EmailSender,
        C: Clock,
    {
        let payload = token::decode_at(
            token,
            &self.secret_key,
            &self.salt,
            self.max_age,
            env.clock.now(),
        )?;
        let issued_at = token::extract_creation_timestamp(token)?;

        let user_id = payload
            .get(fields::USER)
            .and_then(Value::as_i64)
            .ok_or_else(|| AuthError::InvalidField {
                field: fields::USER.to_string(),
            })?;

        let user = env
            .users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound { user_id })?;

        // Issuance is truncated to whole seconds, so a token minted in the
        // same second as a change with a fractional part counts as stale.
        if user
            .password_changed_at
            .is_some_and(|changed_at| issued_at < changed_at)
        {
            return Err(AuthError::PreconditionStale);
        }

        Ok(payload)
    }
}

/// Decode a password reset token, hiding the rejection reason.
///
/// Returns the payload, or the public error code (`"token_invalid"` for
/// every token rejection).
///
/// # Errors
///
/// Returns the public code of the underlying [`AuthError`].
pub async fn decode_password_reset_token<U, E, C>(
    token: &str,
    config: &TokenConfig,
    env: &AuthEnvironment<U, E, C>,
) -> std::result::Result<Payload, &'static str>
where
    U: UserDirectory,
    E: EmailSender,
    C: Clock,
{
    PasswordResetPolicy::from_config(config)
        .decode_with_policy(token, env)
        .await
        .map_err(|e| e.public_code())
}
