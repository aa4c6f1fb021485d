//! Signed token codec.
//!
//! Produces opaque, URL-safe tokens that carry a JSON object payload bound
//! to a *purpose* (the salt). Tokens are encrypted and authenticated with
//! AES-256-GCM, so the payload is both confidential and tamper-evident.
//!
//! # Envelope
//!
//! ```text
//! ┌─────────┬────────────────┬──────────────┬──────────────────────────────┐
//! │ version │ issued-at (BE) │ nonce        │ AES-256-GCM(salt ‖ 0x00 ‖ json) │
//! │ 1 byte  │ 8 bytes        │ 12 bytes     │ n + 16 bytes (tag)           │
//! └─────────┴────────────────┴──────────────┴──────────────────────────────┘
//! ```
//!
//! The version byte and timestamp are passed as associated data, so they
//! are covered by the authentication tag even though they travel in clear.
//! The whole envelope is URL-safe base64 encoded.
//!
//! # Purpose binding
//!
//! The salt is *not* a cryptographic salt. Use a different salt for each
//! flow so that a token minted for one endpoint (e.g. "create buyer user")
//! cannot be replayed against another (e.g. "grant admin rights") that
//! shares the same secret key.
//!
//! # Example
//!
//! ```
//! use dmutils_auth::token::{decode, encode, SecretKey};
//! use chrono::Duration;
//! use serde_json::json;
//!
//! let key = SecretKey::new("k1")?;
//! let token = encode(&json!({"user": 42}), &key, "password-reset")?;
//! let payload = decode(&token, &key, "password-reset", Duration::days(1))?;
//! assert_eq!(payload["user"], 42);
//! # Ok::<(), dmutils_auth::TokenError>(())
//! ```

use crate::constants::{MAX_CLOCK_SKEW_SECONDS, SALT_SEPARATOR, TOKEN_VERSION};
use crate::error::TokenError;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload as AeadPayload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE, Engine};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// Decoded token payload: a JSON object.
pub type Payload = Map<String, Value>;

const TIMESTAMP_LEN: usize = 8;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + TIMESTAMP_LEN;
const MIN_TOKEN_LEN: usize = HEADER_LEN + NONCE_LEN + TAG_LEN;

/// Secret key shared by the encoding and decoding sides.
///
/// Any non-empty byte string is accepted; it is stretched to a 256-bit
/// AES key with SHA-256. The key material never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Create a secret key from raw bytes or a string.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if the key is empty.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(TokenError::InvalidKey);
        }
        Ok(Self(key.to_vec()))
    }

    fn cipher(&self) -> Result<Aes256Gcm, TokenError> {
        let digest = Sha256::digest(&self.0);
        Aes256Gcm::new_from_slice(&digest).map_err(|_| TokenError::InvalidKey)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Encode `payload` into a token bound to `salt`, issued now.
///
/// # Errors
///
/// Returns error if:
/// - `salt` is empty or contains the separator byte
/// - `payload` does not serialize to a JSON object
pub fn encode<T>(payload: &T, secret_key: &SecretKey, salt: &str) -> Result<String, TokenError>
where
    T: Serialize + ?Sized,
{
    encode_at(payload, secret_key, salt, Utc::now())
}

/// Encode `payload` into a token bound to `salt` with an explicit issuance time.
///
/// # Errors
///
/// Returns error if:
/// - `salt` is empty or contains the separator byte
/// - `payload` does not serialize to a JSON object
/// - `issued_at` is before the Unix epoch
pub fn encode_at<T>(
    payload: &T,
    secret_key: &SecretKey,
    salt: &str,
    issued_at: DateTime<Utc>,
) -> Result<String, TokenError>
where
    T: Serialize + ?Sized,
{
    validate_salt(salt)?;

    let value = serde_json::to_value(payload).map_err(|e| TokenError::Serialization(e.to_string()))?;
    if !value.is_object() {
        return Err(TokenError::PayloadNotObject);
    }
    let json = serde_json::to_vec(&value).map_err(|e| TokenError::Serialization(e.to_string()))?;

    let timestamp = u64::try_from(issued_at.timestamp())
        .map_err(|_| TokenError::InvalidTimestamp(issued_at.to_rfc3339()))?;

    let mut header = [0u8; HEADER_LEN];
    header[0] = TOKEN_VERSION;
    header[1..].copy_from_slice(&timestamp.to_be_bytes());

    let mut plaintext = Vec::with_capacity(salt.len() + 1 + json.len());
    plaintext.extend_from_slice(salt.as_bytes());
    plaintext.push(SALT_SEPARATOR);
    plaintext.extend_from_slice(&json);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = secret_key
        .cipher()?
        .encrypt(
            &nonce,
            AeadPayload {
                msg: &plaintext,
                aad: &header,
            },
        )
        .map_err(|e| TokenError::crypto(format!("encryption failed: {e}")))?;

    // Format: [version][timestamp][nonce][ciphertext + tag]
    let mut envelope = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(&header);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);

    Ok(URL_SAFE.encode(envelope))
}

/// Decode a token bound to `salt`, rejecting it if older than `max_age`.
///
/// # Errors
///
/// - [`TokenError::CryptographicFailure`]: wrong key, tampering, bad encoding
/// - [`TokenError::Expired`]: token older than `max_age`
/// - [`TokenError::IssuedInFuture`]: timestamp beyond the allowed clock skew
/// - [`TokenError::PurposeMismatch`]: token was issued for another salt
/// - [`TokenError::MalformedPayload`]: genuine token without a JSON object
pub fn decode(
    token: &str,
    secret_key: &SecretKey,
    salt: &str,
    max_age: Duration,
) -> Result<Payload, TokenError> {
    decode_at(token, secret_key, salt, max_age, Utc::now())
}

/// Decode a token, checking its age against `now` instead of the system clock.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_at(
    token: &str,
    secret_key: &SecretKey,
    salt: &str,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<Payload, TokenError> {
    let envelope = URL_SAFE
        .decode(token.as_bytes())
        .map_err(|e| TokenError::crypto(format!("invalid encoding: {e}")))?;
    let issued_at = read_timestamp(&envelope).map_err(|e| TokenError::crypto(e.to_string()))?;

    let (header, rest) = envelope.split_at(HEADER_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let plaintext = secret_key
        .cipher()?
        .decrypt(
            Nonce::from_slice(nonce),
            AeadPayload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| TokenError::crypto("authentication failed"))?;

    // Only trust the timestamp once the tag has been verified.
    let age_secs = now.timestamp() - issued_at.timestamp();
    if age_secs > max_age.num_seconds() {
        return Err(TokenError::Expired {
            age_secs,
            max_age_secs: max_age.num_seconds(),
        });
    }
    if -age_secs > MAX_CLOCK_SKEW_SECONDS {
        return Err(TokenError::IssuedInFuture {
            ahead_secs: -age_secs,
        });
    }

    let separator = plaintext
        .iter()
        .position(|&b| b == SALT_SEPARATOR)
        .ok_or_else(|| TokenError::MalformedPayload {
            detail: "missing salt separator".to_string(),
        })?;
    let (token_salt, json) = (&plaintext[..separator], &plaintext[separator + 1..]);

    if !constant_time_eq::constant_time_eq(token_salt, salt.as_bytes()) {
        return Err(TokenError::PurposeMismatch);
    }

    match serde_json::from_slice(json) {
        Ok(Value::Object(payload)) => Ok(payload),
        Ok(_) => Err(TokenError::MalformedPayload {
            detail: "payload is not a JSON object".to_string(),
        }),
        Err(e) => Err(TokenError::MalformedPayload {
            detail: e.to_string(),
        }),
    }
}

/// Read the issuance time embedded in a token.
///
/// This does **not** verify the token. Only call it on a token that has
/// already been decoded successfully; never rely on it alone to enforce a
/// security property.
///
/// # Errors
///
/// Returns [`TokenError::Malformed`] if the token is not valid base64 or its
/// envelope has the wrong length or version.
pub fn extract_creation_timestamp(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let envelope = URL_SAFE
        .decode(token.as_bytes())
        .map_err(|e| TokenError::Malformed {
            detail: format!("invalid encoding: {e}"),
        })?;
    read_timestamp(&envelope)
}

fn read_timestamp(envelope: &[u8]) -> Result<DateTime<Utc>, TokenError> {
    if envelope.len() < MIN_TOKEN_LEN {
        return Err(TokenError::Malformed {
            detail: format!(
                "token is {} bytes, expected at least {MIN_TOKEN_LEN}",
                envelope.len()
            ),
        });
    }
    if envelope[0] != TOKEN_VERSION {
        return Err(TokenError::Malformed {
            detail: format!("unknown version byte {:#04x}", envelope[0]),
        });
    }

    let mut raw = [0u8; TIMESTAMP_LEN];
    raw.copy_from_slice(&envelope[1..HEADER_LEN]);
    let seconds = i64::try_from(u64::from_be_bytes(raw)).map_err(|_| TokenError::Malformed {
        detail: "timestamp out of range".to_string(),
    })?;

    DateTime::from_timestamp(seconds, 0).ok_or_else(|| TokenError::Malformed {
        detail: "timestamp out of range".to_string(),
    })
}

fn validate_salt(salt: &str) -> Result<(), TokenError> {
    if salt.is_empty() {
        return Err(TokenError::InvalidSalt {
            detail: "salt must not be empty".to_string(),
        });
    }
    if salt.as_bytes().contains(&SALT_SEPARATOR) {
        return Err(TokenError::InvalidSalt {
            detail: "salt must not contain a NUL byte".to_string(),
        });
    }
    Ok(())
}
