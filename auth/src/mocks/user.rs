//! Mock user directory for testing.

use crate::error::{AuthError, Result};
use crate::providers::UserDirectory;
use crate::user::User;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock user directory.
///
/// Uses in-memory storage for testing. Can be switched into a failing mode
/// to exercise directory outages.
#[derive(Debug, Clone, Default)]
pub struct MockUserDirectory {
    users: Arc<Mutex<HashMap<i64, User>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MockUserDirectory {
    /// Create an empty mock user directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `users`.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let directory = Self::new();
        for user in users {
            directory.insert(user);
        }
        directory
    }

    /// Insert or replace a user.
    pub fn insert(&self, user: User) {
        if let Ok(mut users) = self.users.lock() {
            users.insert(user.id, user);
        }
    }

    /// Make every subsequent lookup fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut flag) = self.unavailable.lock() {
            *flag = unavailable;
        }
    }
}

impl UserDirectory for MockUserDirectory {
    fn get_user(&self, user_id: i64) -> impl Future<Output = Result<Option<User>>> + Send {
        let users = Arc::clone(&self.users);
        let unavailable = Arc::clone(&self.unavailable);

        async move {
            if *unavailable.lock().map_err(|_| AuthError::Internal("lock poisoned".to_string()))? {
                return Err(AuthError::Directory("data API unavailable".to_string()));
            }

            Ok(users
                .lock()
                .map_err(|_| AuthError::Internal("lock poisoned".to_string()))?
                .get(&user_id)
                .cloned())
        }
    }
}
