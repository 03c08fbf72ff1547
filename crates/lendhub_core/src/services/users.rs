//! crates/lendhub_core/src/services/users.rs
//!
//! The user directory. Creation performs no duplicate-email pre-check (the
//! unique constraint in storage is the backstop, surfaced as
//! `DuplicateEmail`); updates re-check uniqueness explicitly.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{NewUser, User, UserPatch};
use crate::ports::{PortError, PortResult, Storage};
use crate::services::require_user;

#[derive(Clone)]
pub struct UserService {
    storage: Arc<dyn Storage>,
}

impl UserService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, new: NewUser) -> PortResult<User> {
        let user = self.storage.create_user(&new).await?;
        debug!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> PortResult<User> {
        require_user(self.storage.as_ref(), id).await
    }

    pub async fn list(&self) -> PortResult<Vec<User>> {
        self.storage.list_users().await
    }

    /// Changing the email re-checks uniqueness; keeping the current email is
    /// a no-op success. Blank name updates are ignored.
    pub async fn update(&self, id: i64, patch: UserPatch) -> PortResult<User> {
        let mut user = require_user(self.storage.as_ref(), id).await?;

        if let Some(email) = patch.email {
            if email != user.email {
                if self.storage.find_user_by_email(&email).await?.is_some() {
                    return Err(PortError::DuplicateEmail(email));
                }
                user.email = email;
            }
        }
        if let Some(name) = patch.name {
            if !name.trim().is_empty() {
                user.name = name;
            }
        }

        self.storage.save_user(&user).await
    }

    /// Returns the deleted record.
    pub async fn delete(&self, id: i64) -> PortResult<User> {
        let user = require_user(self.storage.as_ref(), id).await?;
        self.storage.delete_user(id).await?;
        debug!(user_id = id, "user deleted");
        Ok(user)
    }
}
