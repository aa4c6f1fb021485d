//! Token, email and logging configuration.
//!
//! Configuration values should be provided by the application, not hardcoded.
//! Each struct can be built in code (`new` + `with_*`) or read from the
//! process environment with `from_env`.

use crate::constants::{INVITATION_MAX_AGE_SECONDS, ONE_DAY_IN_SECONDS};
use crate::error::{AuthError, Result};
use crate::token::SecretKey;
use chrono::Duration;
use std::path::PathBuf;

/// Keys, purpose salts and lifetimes for the token policies.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// General application secret; encrypts password-reset tokens.
    pub secret_key: SecretKey,

    /// Purpose salt for password-reset tokens.
    pub reset_password_salt: String,

    /// Key shared between applications that exchange invitation emails.
    pub shared_email_key: SecretKey,

    /// Purpose salt for invitation tokens.
    pub invite_email_salt: String,

    /// Password-reset token lifetime.
    ///
    /// Default: 1 day
    pub password_reset_max_age: Duration,

    /// Invitation token lifetime.
    ///
    /// Default: 7 days
    pub invitation_max_age: Duration,
}

impl TokenConfig {
    /// Create new token configuration with default lifetimes.
    #[must_use]
    pub const fn new(
        secret_key: SecretKey,
        reset_password_salt: String,
        shared_email_key: SecretKey,
        invite_email_salt: String,
    ) -> Self {
        Self {
            secret_key,
            reset_password_salt,
            shared_email_key,
            invite_email_salt,
            password_reset_max_age: Duration::seconds(ONE_DAY_IN_SECONDS),
            invitation_max_age: Duration::seconds(INVITATION_MAX_AGE_SECONDS),
        }
    }

    /// Read configuration from `SECRET_KEY`, `RESET_PASSWORD_SALT`,
    /// `SHARED_EMAIL_KEY` and `INVITE_EMAIL_SALT`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Read configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a variable is missing or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self::new(
            required_secret(&lookup, "SECRET_KEY")?,
            required(&lookup, "RESET_PASSWORD_SALT")?,
            required_secret(&lookup, "SHARED_EMAIL_KEY")?,
            required(&lookup, "INVITE_EMAIL_SALT")?,
        ))
    }

    /// Set password-reset token lifetime.
    #[must_use]
    pub const fn with_password_reset_max_age(mut self, max_age: Duration) -> Self {
        self.password_reset_max_age = max_age;
        self
    }

    /// Set invitation token lifetime.
    #[must_use]
    pub const fn with_invitation_max_age(mut self, max_age: Duration) -> Self {
        self.invitation_max_age = max_age;
        self
    }
}

/// Outbound email options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailConfig {
    /// Write emails to stderr instead of delivering them.
    pub send_to_stderr: bool,

    /// Address blind-copied on every email.
    pub bcc_address: Option<String>,

    /// Bounce address; falls back to reply-to, then the sender.
    pub return_address: Option<String>,
}

impl EmailConfig {
    /// Read configuration from `DM_SEND_EMAIL_TO_STDERR`,
    /// `DM_EMAIL_BCC_ADDRESS` and `DM_EMAIL_RETURN_ADDRESS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Read configuration through `lookup` instead of the process environment.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            send_to_stderr: optional(&lookup, "DM_SEND_EMAIL_TO_STDERR").is_some_and(|v| is_truthy(&v)),
            bcc_address: optional(&lookup, "DM_EMAIL_BCC_ADDRESS"),
            return_address: optional(&lookup, "DM_EMAIL_RETURN_ADDRESS"),
        }
    }

    /// Write emails to stderr instead of sending them.
    #[must_use]
    pub const fn with_send_to_stderr(mut self, send_to_stderr: bool) -> Self {
        self.send_to_stderr = send_to_stderr;
        self
    }

    /// Blind-copy every email to `address`.
    #[must_use]
    pub fn with_bcc_address(mut self, address: impl Into<String>) -> Self {
        self.bcc_address = Some(address.into());
        self
    }

    /// Use `address` as the bounce address.
    #[must_use]
    pub fn with_return_address(mut self, address: impl Into<String>) -> Self {
        self.return_address = Some(address.into());
        self
    }
}

/// Logging options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    ///
    /// Default: `info`
    pub level: String,

    /// Application name stamped on every log record.
    ///
    /// Default: `none`
    pub app_name: String,

    /// Log to this file (plus a `.json` sibling) instead of stderr.
    pub log_path: Option<PathBuf>,
}

impl LogConfig {
    /// Create new logging configuration.
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    /// Read configuration from `DM_LOG_LEVEL`, `DM_APP_NAME` and `DM_LOG_PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Read configuration through `lookup` instead of the process environment.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            level: optional(&lookup, "DM_LOG_LEVEL").map_or(defaults.level, |v| v.to_lowercase()),
            app_name: optional(&lookup, "DM_APP_NAME").unwrap_or(defaults.app_name),
            log_path: optional(&lookup, "DM_LOG_PATH").map(PathBuf::from),
        }
    }

    /// Set the default log level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Log to files under `path`.
    #[must_use]
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            app_name: "none".to_string(),
            log_path: None,
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// Empty values count as unset.
fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    optional(lookup, name).ok_or_else(|| AuthError::Configuration(format!("{name} is not set")))
}

fn required_secret(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<SecretKey> {
    SecretKey::new(required(lookup, name)?)
        .map_err(|e| AuthError::Configuration(format!("{name}: {e}")))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn secret(s: &str) -> SecretKey {
        SecretKey::new(s).expect("non-empty key")
    }

    #[test]
    fn test_token_config_builder() {
        let config = TokenConfig::new(
            secret("secret"),
            "ResetPasswordSalt".to_string(),
            secret("shared"),
            "InviteEmailSalt".to_string(),
        )
        .with_password_reset_max_age(Duration::hours(2))
        .with_invitation_max_age(Duration::days(14));

        assert_eq!(config.reset_password_salt, "ResetPasswordSalt");
        assert_eq!(config.invite_email_salt, "InviteEmailSalt");
        assert_eq!(config.password_reset_max_age, Duration::hours(2));
        assert_eq!(config.invitation_max_age, Duration::days(14));
    }

    #[test]
    fn test_token_config_default_lifetimes() {
        let config = TokenConfig::new(
            secret("secret"),
            "reset".to_string(),
            secret("shared"),
            "invite".to_string(),
        );

        assert_eq!(config.password_reset_max_age, Duration::days(1));
        assert_eq!(config.invitation_max_age, Duration::days(7));
    }

    #[test]
    fn test_email_config_builder() {
        let config = EmailConfig::default()
            .with_send_to_stderr(true)
            .with_bcc_address("audit@example.com")
            .with_return_address("bounces@example.com");

        assert!(config.send_to_stderr);
        assert_eq!(config.bcc_address.as_deref(), Some("audit@example.com"));
        assert_eq!(config.return_address.as_deref(), Some("bounces@example.com"));
    }

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::new("buyer-frontend").with_level("debug");

        assert_eq!(config.app_name, "buyer-frontend");
        assert_eq!(config.level, "debug");
        assert_eq!(config.log_path, None);
        assert_eq!(LogConfig::default().level, "info");
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const TOKEN_VARS: [(&str, &str); 4] = [
        ("SECRET_KEY", "secret"),
        ("RESET_PASSWORD_SALT", "ResetPasswordSalt"),
        ("SHARED_EMAIL_KEY", "shared"),
        ("INVITE_EMAIL_SALT", "InviteEmailSalt"),
    ];

    #[test]
    fn test_token_config_from_lookup() {
        let config = TokenConfig::from_lookup(lookup(&TOKEN_VARS)).expect("complete config");

        assert_eq!(config.secret_key, secret("secret"));
        assert_eq!(config.shared_email_key, secret("shared"));
        assert_eq!(config.reset_password_salt, "ResetPasswordSalt");
        assert_eq!(config.invite_email_salt, "InviteEmailSalt");
        assert_eq!(config.password_reset_max_age, Duration::days(1));
    }

    #[test]
    fn test_token_config_missing_secret_key() {
        let err = TokenConfig::from_lookup(lookup(&TOKEN_VARS[1..])).unwrap_err();

        assert_eq!(err, AuthError::Configuration("SECRET_KEY is not set".to_string()));
    }

    #[test]
    fn test_token_config_empty_secret_key() {
        let mut vars = TOKEN_VARS;
        vars[0] = ("SECRET_KEY", "");

        let err = TokenConfig::from_lookup(lookup(&vars)).unwrap_err();

        assert!(matches!(err, AuthError::Configuration(msg) if msg.contains("SECRET_KEY")));
    }

    #[test]
    fn test_email_config_from_lookup() {
        let config = EmailConfig::from_lookup(lookup(&[
            ("DM_SEND_EMAIL_TO_STDERR", "True"),
            ("DM_EMAIL_BCC_ADDRESS", "audit@example.com"),
            ("DM_EMAIL_RETURN_ADDRESS", ""),
        ]));

        assert!(config.send_to_stderr);
        assert_eq!(config.bcc_address.as_deref(), Some("audit@example.com"));
        assert_eq!(config.return_address, None);
    }

    #[test]
    fn test_email_config_stderr_flag_must_be_truthy() {
        let off = EmailConfig::from_lookup(lookup(&[("DM_SEND_EMAIL_TO_STDERR", "false")]));
        let unset = EmailConfig::from_lookup(lookup(&[]));

        assert!(!off.send_to_stderr);
        assert_eq!(unset, EmailConfig::default());
    }

    #[test]
    fn test_log_config_from_lookup() {
        let config = LogConfig::from_lookup(lookup(&[
            ("DM_LOG_LEVEL", "DEBUG"),
            ("DM_APP_NAME", "buyer-frontend"),
            ("DM_LOG_PATH", "/var/log/buyer-frontend.log"),
        ]));

        assert_eq!(config.level, "debug");
        assert_eq!(config.app_name, "buyer-frontend");
        assert_eq!(
            config.log_path,
            Some(PathBuf::from("/var/log/buyer-frontend.log"))
        );
    }

    #[test]
    fn test_log_config_from_empty_lookup() {
        let config = LogConfig::from_lookup(lookup(&[]));

        assert_eq!(config.level, "info");
        assert_eq!(config.app_name, "none");
        assert_eq!(config.log_path, None);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(is_truthy("YES"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("0"));
    }
}
