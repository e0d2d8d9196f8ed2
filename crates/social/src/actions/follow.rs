//! Follow handler
//!
//! Coordinates between the follow endpoints and the locally cached list of
//! users the signed-in user follows.

use log::info;
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::api::DirectoryApi;
use crate::error::Result;
use crate::models::{Follow, FollowKind, UserId};
use crate::session::SessionContext;

/// Handler for follow/unfollow actions
///
/// Actions are performed in two steps:
/// 1. Call the API to update server state
/// 2. Update the local following set to reflect the change
///
/// The local set is only touched after the server accepts the change.
pub struct FollowHandler {
    api: Arc<dyn DirectoryApi>,
    session: Arc<SessionContext>,
    following: RwLock<BTreeSet<String>>,
}

impl FollowHandler {
    /// Create a new follow handler
    pub fn new(api: Arc<dyn DirectoryApi>, session: Arc<SessionContext>) -> Self {
        Self {
            api,
            session,
            following: RwLock::new(BTreeSet::new()),
        }
    }

    /// Replace the local following set from the server
    ///
    /// Returns the number of users followed.
    pub fn load_following(&self) -> Result<usize> {
        let session = self.session.require()?;
        let follows = self.api.list_follows(session.user_id, FollowKind::Following)?;

        let names: BTreeSet<String> = follows
            .iter()
            .filter_map(|f| f.following_name().map(str::to_string))
            .collect();
        let count = names.len();
        *self.following.write().unwrap_or_else(PoisonError::into_inner) = names;
        Ok(count)
    }

    /// List either side of the follow graph for any user
    pub fn list(&self, user: UserId, kind: FollowKind) -> Result<Vec<Follow>> {
        self.api.list_follows(user, kind)
    }

    /// Follow a user
    pub fn follow(&self, user: UserId, username: &str) -> Result<()> {
        let session = self.session.require()?;
        info!("Following user {} ({})", user, username);

        self.api.follow(&session.token, user)?;

        self.following
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username.to_string());
        Ok(())
    }

    /// Stop following a user
    pub fn unfollow(&self, user: UserId, username: &str) -> Result<()> {
        let session = self.session.require()?;
        info!("Unfollowing user {} ({})", user, username);

        self.api.unfollow(&session.token, session.user_id, user)?;

        self.following
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(username);
        Ok(())
    }

    /// Check if the signed-in user follows `username`
    pub fn is_following(&self, username: &str) -> bool {
        self.following
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(username)
    }

    /// Usernames currently followed, sorted
    pub fn following(&self) -> Vec<String> {
        self.following
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{FakeDirectory, login};
    use crate::error::ClientError;
    use crate::models::UserRef;

    #[test]
    fn test_load_following() {
        let api = Arc::new(FakeDirectory::default());
        api.set_follows(vec![
            Follow {
                following_username: Some("bob".to_string()),
                ..Default::default()
            },
            Follow {
                following_username: None,
                ..Default::default()
            },
        ]);
        let handler = FollowHandler::new(api.clone(), login(1));

        assert_eq!(handler.load_following().unwrap(), 1);
        assert!(handler.is_following("bob"));
        assert_eq!(api.calls(), vec!["list_follows 1 following".to_string()]);
    }

    #[test]
    fn test_load_following_nested_users() {
        let api = Arc::new(FakeDirectory::default());
        api.set_follows(vec![Follow {
            follower: Some(UserRef::with_name(UserId(1), "ada")),
            following: Some(UserRef::with_name(UserId(2), "bob")),
            ..Default::default()
        }]);
        let handler = FollowHandler::new(api.clone(), login(1));

        assert_eq!(handler.load_following().unwrap(), 1);
        assert_eq!(handler.following(), vec!["bob".to_string()]);
    }

    #[test]
    fn test_follow_updates_set_only_on_success() {
        let api = Arc::new(FakeDirectory::default());
        let handler = FollowHandler::new(api.clone(), login(1));

        handler.follow(UserId(2), "bob").unwrap();
        assert_eq!(handler.following(), vec!["bob".to_string()]);

        api.fail_next(ClientError::Http {
            status: 409,
            message: "already following".to_string(),
        });
        assert!(handler.follow(UserId(3), "carol").is_err());
        assert!(!handler.is_following("carol"));
    }

    #[test]
    fn test_unfollow_sends_both_ids() {
        let api = Arc::new(FakeDirectory::default());
        let handler = FollowHandler::new(api.clone(), login(1));

        handler.follow(UserId(2), "bob").unwrap();
        handler.unfollow(UserId(2), "bob").unwrap();

        assert!(!handler.is_following("bob"));
        assert_eq!(api.calls().last().unwrap(), "unfollow 1 2");
    }

    #[test]
    fn test_requires_session() {
        let api = Arc::new(FakeDirectory::default());
        let handler = FollowHandler::new(api.clone(), Arc::new(SessionContext::new()));

        assert_eq!(
            handler.follow(UserId(2), "bob"),
            Err(ClientError::NotAuthenticated)
        );
        assert!(api.calls().is_empty());
    }
}
