//! User directory trait.

use crate::error::Result;
use crate::user::User;
use std::future::Future;

/// User directory.
///
/// This trait abstracts over the remote data API that owns user accounts.
/// Timeouts and retries are the implementation's responsibility.
pub trait UserDirectory: Send + Sync {
    /// Get user by ID.
    ///
    /// # Returns
    ///
    /// `None` if no such user exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::Directory`] if the lookup itself fails.
    fn get_user(&self, user_id: i64) -> impl Future<Output = Result<Option<User>>> + Send;
}
