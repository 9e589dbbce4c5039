//! Users API.

use std::sync::Arc;

use paanj_admin::{AdminCore, Error, HttpClientExt, Method, Result, Unsubscribe};
use serde_json::Value;

use super::item_path;
use crate::query::UserListQuery;
use crate::subscriptions::Subscriber;
use crate::types::{BlockRequest, CreateUserData, UpdateUserData, User, UserFilters};

/// Users API client.
pub struct UsersResource {
    admin: Arc<dyn AdminCore>,
    subscriber: Subscriber,
    base_path: String,
}

impl UsersResource {
    pub(crate) fn new(admin: Arc<dyn AdminCore>, subscriber: Subscriber, base_path: String) -> Self {
        Self {
            admin,
            subscriber,
            base_path,
        }
    }

    fn user_path(&self, user_id: &str) -> Result<String> {
        item_path(&self.base_path, user_id)
    }

    /// Create a new user.
    pub async fn create(&self, data: &CreateUserData) -> Result<User> {
        tracing::debug!(email = %data.email, "Creating user");
        self.admin
            .http_client()
            .request_json(Method::POST, &self.base_path, Some(data))
            .await
    }

    /// Get a user by ID.
    pub async fn get(&self, user_id: &str) -> Result<User> {
        self.admin
            .http_client()
            .request_json::<_, ()>(Method::GET, &self.user_path(user_id)?, None)
            .await
    }

    /// Update a user. Merge semantics are the server's.
    pub async fn update(&self, user_id: &str, updates: &UpdateUserData) -> Result<User> {
        tracing::debug!(user_id, "Updating user");
        self.admin
            .http_client()
            .request_json(Method::PATCH, &self.user_path(user_id)?, Some(updates))
            .await
    }

    /// Delete a user.
    pub async fn delete(&self, user_id: &str) -> Result<()> {
        tracing::debug!(user_id, "Deleting user");
        self.admin
            .http_client()
            .request_unit::<()>(Method::DELETE, &self.user_path(user_id)?, None)
            .await
    }

    /// Start a list query seeded with `filters`.
    pub fn list(&self, filters: UserFilters) -> UserListQuery {
        UserListQuery::new(Arc::clone(&self.admin), self.base_path.clone(), filters)
    }

    /// Block `blocked_id` on behalf of `blocker_id`.
    ///
    /// `blocked_id` must be a decimal integer; nothing is sent otherwise.
    pub async fn block(&self, blocker_id: &str, blocked_id: &str) -> Result<()> {
        self.block_action(blocker_id, blocked_id, "block").await
    }

    /// Unblock `blocked_id` on behalf of `blocker_id`.
    pub async fn unblock(&self, blocker_id: &str, blocked_id: &str) -> Result<()> {
        self.block_action(blocker_id, blocked_id, "unblock").await
    }

    async fn block_action(&self, blocker_id: &str, blocked_id: &str, action: &str) -> Result<()> {
        let body = BlockRequest {
            blocked_user_id: parse_user_number(blocked_id)?,
        };
        tracing::debug!(blocker_id, blocked_id, action, "Changing block state");
        let path = format!("{}/{}", self.user_path(blocker_id)?, action);
        self.admin
            .http_client()
            .request_unit(Method::POST, &path, Some(&body))
            .await
    }

    /// Listen to user creation events platform-wide.
    pub fn on_create<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("user.create", callback)
    }

    /// Listen to user update events platform-wide.
    pub fn on_update<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("user.update", callback)
    }

    /// Listen to user deletion events platform-wide.
    pub fn on_delete<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("user.delete", callback)
    }
}

fn parse_user_number(id: &str) -> Result<i64> {
    id.trim().parse::<i64>().map_err(|_| {
        Error::InvalidArgument(format!("user id '{}' is not an integer", id))
    })
}
