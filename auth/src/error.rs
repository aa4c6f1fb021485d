//! Error types for token encoding, decoding and the policies built on top.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// User-facing code for every rejected token.
///
/// Callers show this instead of the specific reason so that the response
/// does not reveal which check failed.
pub const TOKEN_INVALID: &str = "token_invalid";

/// Coarse error categories used for audit logging.
///
/// Every [`TokenError`] and [`AuthError`] maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Ciphertext failed authentication, or the token is malformed.
    CryptographicFailure,
    /// Token is older than the allowed maximum age (or dated in the future).
    Expired,
    /// Token decrypted fine but was issued for a different purpose.
    PurposeMismatch,
    /// Token is genuine but issued before a relevant account change.
    PreconditionStale,
    /// Decoded payload is missing required fields.
    SchemaInvalid,
    /// The user referenced by the token does not exist.
    UserNotFound,
    /// Key, salt or environment configuration is invalid.
    Configuration,
    /// An external collaborator (user directory, email delivery) failed.
    Collaborator,
    /// Anything else.
    Internal,
}

/// Errors produced by the signed token codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token is not valid URL-safe base64, has the wrong length or version,
    /// or failed authenticated decryption.
    #[error("Cryptographic failure: {detail}")]
    CryptographicFailure {
        /// What went wrong
        detail: String,
    },

    /// Token is older than the maximum age.
    #[error("Token expired: issued {age_secs}s ago, max age {max_age_secs}s")]
    Expired {
        /// Age of the token in seconds
        age_secs: i64,
        /// Maximum accepted age in seconds
        max_age_secs: i64,
    },

    /// Token timestamp is further in the future than the allowed clock skew.
    #[error("Token issued {ahead_secs}s in the future")]
    IssuedInFuture {
        /// How far ahead of the current time the token claims to be
        ahead_secs: i64,
    },

    /// The embedded purpose salt differs from the expected one.
    #[error("Token purpose mismatch")]
    PurposeMismatch,

    /// Decrypted plaintext lacks the separator or carries invalid JSON.
    #[error("Malformed token payload: {detail}")]
    MalformedPayload {
        /// What went wrong
        detail: String,
    },

    /// Token envelope could not be parsed (used by timestamp extraction).
    #[error("Malformed token: {detail}")]
    Malformed {
        /// What went wrong
        detail: String,
    },

    /// Salt is empty or contains the reserved separator byte.
    #[error("Invalid salt: {detail}")]
    InvalidSalt {
        /// What went wrong
        detail: String,
    },

    /// Secret key is empty.
    #[error("Invalid secret key")]
    InvalidKey,

    /// Payload does not serialize to a JSON object.
    #[error("Token payload must be a JSON object")]
    PayloadNotObject,

    /// Issuance time cannot be represented in the envelope.
    #[error("Invalid token timestamp: {0}")]
    InvalidTimestamp(String),

    /// Payload serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TokenError {
    /// Category of this error for audit logging.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CryptographicFailure { .. }
            | Self::MalformedPayload { .. }
            | Self::Malformed { .. } => ErrorKind::CryptographicFailure,
            Self::Expired { .. } | Self::IssuedInFuture { .. } => ErrorKind::Expired,
            Self::PurposeMismatch => ErrorKind::PurposeMismatch,
            Self::InvalidSalt { .. } | Self::InvalidKey => ErrorKind::Configuration,
            Self::PayloadNotObject | Self::InvalidTimestamp(_) | Self::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn crypto(detail: impl Into<String>) -> Self {
        Self::CryptographicFailure {
            detail: detail.into(),
        }
    }
}

/// Errors produced by the token policies and their collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Token Errors
    // ═══════════════════════════════════════════════════════════

    /// The codec rejected the token.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Token was issued before the user's password was last changed.
    #[error("Token issued before the password was last changed")]
    PreconditionStale,

    /// Decoded payload is missing required fields.
    #[error("Token is missing required keys: {missing:?}")]
    MissingFields {
        /// Names of the missing fields
        missing: Vec<String>,
    },

    /// A payload field has the wrong type.
    #[error("Token field '{field}' is invalid")]
    InvalidField {
        /// Name of the offending field
        field: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Collaborator Errors
    // ═══════════════════════════════════════════════════════════

    /// User referenced by the token was not found.
    #[error("User {user_id} not found")]
    UserNotFound {
        /// The user id from the token
        user_id: i64,
    },

    /// User directory lookup failed.
    #[error("User directory error: {0}")]
    Directory(String),

    /// User record from the API could not be parsed.
    #[error("Invalid user record: {0}")]
    InvalidUserRecord(String),

    /// Email delivery failed.
    #[error("Failed to send email: {0}")]
    EmailDeliveryFailed(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Category of this error for audit logging.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dmutils_auth::{AuthError, ErrorKind};
    /// assert_eq!(AuthError::PreconditionStale.kind(), ErrorKind::PreconditionStale);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Token(e) => e.kind(),
            Self::PreconditionStale => ErrorKind::PreconditionStale,
            Self::MissingFields { .. } | Self::InvalidField { .. } => ErrorKind::SchemaInvalid,
            Self::UserNotFound { .. } => ErrorKind::UserNotFound,
            Self::Directory(_) | Self::EmailDeliveryFailed(_) => ErrorKind::Collaborator,
            Self::InvalidUserRecord(_) | Self::Internal(_) => ErrorKind::Internal,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if this error means the presented token must be
    /// rejected, as opposed to a configuration or system failure.
    #[must_use]
    pub const fn is_token_rejection(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CryptographicFailure
                | ErrorKind::Expired
                | ErrorKind::PurposeMismatch
                | ErrorKind::PreconditionStale
                | ErrorKind::SchemaInvalid
                | ErrorKind::UserNotFound
        )
    }

    /// Returns `true` if this error hints at tampering or token replay.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dmutils_auth::{AuthError, TokenError};
    /// assert!(AuthError::Token(TokenError::PurposeMismatch).is_security_issue());
    /// assert!(!AuthError::PreconditionStale.is_security_issue());
    /// ```
    #[must_use]
    pub const fn is_security_issue(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CryptographicFailure | ErrorKind::PurposeMismatch
        )
    }

    /// Code shown to end users.
    ///
    /// All token rejections collapse into [`TOKEN_INVALID`].
    #[must_use]
    pub const fn public_code(&self) -> &'static str {
        if self.is_token_rejection() {
            TOKEN_INVALID
        } else {
            "internal_error"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_rejections_share_public_code() {
        let errors = [
            AuthError::Token(TokenError::crypto("bad tag")),
            AuthError::Token(TokenError::Expired {
                age_secs: 90_000,
                max_age_secs: 86_400,
            }),
            AuthError::Token(TokenError::PurposeMismatch),
            AuthError::PreconditionStale,
            AuthError::MissingFields {
                missing: vec!["email_address".to_string()],
            },
            AuthError::UserNotFound { user_id: 7 },
        ];

        for error in errors {
            assert_eq!(error.public_code(), TOKEN_INVALID, "{error}");
        }
    }

    #[test]
    fn test_kinds_stay_distinct_internally() {
        assert_eq!(
            AuthError::Token(TokenError::PurposeMismatch).kind(),
            ErrorKind::PurposeMismatch
        );
        assert_eq!(
            AuthError::Token(TokenError::IssuedInFuture { ahead_secs: 120 }).kind(),
            ErrorKind::Expired
        );
        assert_eq!(
            AuthError::Token(TokenError::MalformedPayload {
                detail: "no separator".to_string()
            })
            .kind(),
            ErrorKind::CryptographicFailure
        );
        assert_eq!(
            AuthError::EmailDeliveryFailed("smtp down".to_string()).kind(),
            ErrorKind::Collaborator
        );
    }

    #[test]
    fn test_system_errors_are_not_token_rejections() {
        assert!(!AuthError::Configuration("SECRET_KEY not set".to_string()).is_token_rejection());
        assert!(!AuthError::Directory("timeout".to_string()).is_token_rejection());
        assert_eq!(
            AuthError::Internal("boom".to_string()).public_code(),
            "internal_error"
        );
    }
}
