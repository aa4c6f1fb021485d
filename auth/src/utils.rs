//! Utility functions for logging without leaking personal data.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use sha2::{Digest, Sha256};

/// Number of token characters kept by [`token_prefix`].
const TOKEN_PREFIX_LEN: usize = 12;

/// Hash an email address for logging.
///
/// Returns the URL-safe base64 encoding of the SHA-256 digest, so the same
/// address always maps to the same opaque string.
///
/// # Examples
///
/// ```
/// use dmutils_auth::utils::hash_email;
///
/// assert_eq!(hash_email("user@example.com"), hash_email("user@example.com"));
/// assert_ne!(hash_email("user@example.com"), hash_email("other@example.com"));
/// ```
#[must_use]
pub fn hash_email(email: &str) -> String {
    URL_SAFE.encode(Sha256::digest(email.as_bytes()))
}

/// Shorten a token for log output.
///
/// Tokens are bearer credentials, so only a short prefix is ever logged.
///
/// # Examples
///
/// ```
/// use dmutils_auth::utils::token_prefix;
///
/// assert_eq!(token_prefix("gAAAAABlAbCdEfGhIjKlMnOp"), "gAAAAABlAbCd…");
/// assert_eq!(token_prefix("short"), "short");
/// ```
#[must_use]
pub fn token_prefix(token: &str) -> String {
    match token.char_indices().nth(TOKEN_PREFIX_LEN) {
        Some((index, _)) => format!("{}…", &token[..index]),
        None => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_email_known_value() {
        // sha256("user@example.com"), URL-safe base64
        assert_eq!(
            hash_email("user@example.com"),
            "tMmiiTI7IaAcPpQPFQ65uMVCWH8av9jw4cwf_F5HVRQ="
        );
    }

    #[test]
    fn test_hash_email_is_url_safe() {
        let hashed = hash_email("someone+tag@example.gov.au");

        assert_eq!(hashed.len(), 44);
        assert!(!hashed.contains('+'));
        assert!(!hashed.contains('/'));
    }

    #[test]
    fn test_token_prefix_multibyte() {
        let token = "ééééééééééééé";

        assert_eq!(token_prefix(token), "éééééééééééé…");
    }
}
