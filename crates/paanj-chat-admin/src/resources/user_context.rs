//! Block/unblock on behalf of one user.

use std::sync::Arc;

use paanj_admin::Result;

use super::users::UsersResource;

/// A [`UsersResource`] view bound to one blocker.
#[derive(Clone)]
pub struct AdminUserContext {
    blocker_id: String,
    users: Arc<UsersResource>,
}

impl AdminUserContext {
    pub fn new(blocker_id: impl Into<String>, users: Arc<UsersResource>) -> Self {
        Self {
            blocker_id: blocker_id.into(),
            users,
        }
    }

    /// The user blocking or unblocking.
    pub fn blocker_id(&self) -> &str {
        &self.blocker_id
    }

    pub async fn block(&self, blocked_id: &str) -> Result<()> {
        self.users.block(&self.blocker_id, blocked_id).await
    }

    pub async fn unblock(&self, blocked_id: &str) -> Result<()> {
        self.users.unblock(&self.blocker_id, blocked_id).await
    }
}

impl std::fmt::Debug for AdminUserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUserContext")
            .field("blocker_id", &self.blocker_id)
            .finish()
    }
}
