//! Profile and user search handler

use log::info;
use std::sync::Arc;

use crate::api::DirectoryApi;
use crate::error::{ClientError, Result};
use crate::models::{ProfileUpdate, UserId, UserProfile};
use crate::session::SessionContext;

/// Handler for viewing and editing profiles
pub struct ProfileHandler {
    api: Arc<dyn DirectoryApi>,
    session: Arc<SessionContext>,
}

impl ProfileHandler {
    /// Create a new profile handler
    pub fn new(api: Arc<dyn DirectoryApi>, session: Arc<SessionContext>) -> Self {
        Self { api, session }
    }

    /// Fetch a user's public profile
    pub fn get(&self, id: UserId) -> Result<UserProfile> {
        self.api.get_user(id)
    }

    /// Fetch the signed-in user's own profile
    pub fn get_own(&self) -> Result<UserProfile> {
        let session = self.session.require()?;
        self.api.get_user(session.user_id)
    }

    /// Save a profile
    ///
    /// The body must describe the same user as the path.
    pub fn update(&self, id: UserId, update: &ProfileUpdate) -> Result<()> {
        if id.get() <= 0 {
            return Err(ClientError::validation(format!("'{}' is not a valid user id", id)));
        }
        if update.user_id != id {
            return Err(ClientError::validation(format!(
                "profile for user {} cannot be saved as user {}",
                update.user_id, id
            )));
        }
        let session = self.session.require()?;

        info!("Updating profile of user {}", id);
        self.api.update_user(&session.token, id, update)
    }

    /// Search users by name; a blank query returns nothing without a request
    pub fn search(&self, query: &str) -> Result<Vec<UserProfile>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.api.search_users(query)
    }
}
