//! Chainable list queries.
//!
//! ```no_run
//! # async fn example(chat: &paanj_chat_admin::AdminChat) -> paanj_chat_admin::Result<()> {
//! let conversations = chat
//!     .conversations()
//!     .list(Default::default())
//!     .user_id("u1")
//!     .limit(10)
//!     .page(2)
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use paanj_admin::{AdminCore, HttpClientExt, Method, Result};
use url::form_urlencoded;

use crate::types::{Conversation, ConversationFilters, User, UserFilters};

/// Page size `page()` assumes when no limit has been set.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

fn page_offset(page: u32, limit: Option<u32>) -> u32 {
    page.saturating_sub(1)
        .saturating_mul(limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE))
}

/// Append `?query` for the present, non-zero parameters.
fn with_query(base: &str, params: &[(&str, Option<String>)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (name, value) in params {
        if let Some(value) = value {
            serializer.append_pair(name, value);
            any = true;
        }
    }
    if any {
        format!("{}?{}", base, serializer.finish())
    } else {
        base.to_string()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn non_zero(value: Option<u32>) -> Option<String> {
    value.filter(|v| *v > 0).map(|v| v.to_string())
}

/// Pending `GET` of the user collection.
#[must_use = "a list query does nothing until `send` is awaited"]
pub struct UserListQuery {
    admin: Arc<dyn AdminCore>,
    path: String,
    filters: UserFilters,
}

impl UserListQuery {
    pub(crate) fn new(admin: Arc<dyn AdminCore>, path: String, filters: UserFilters) -> Self {
        Self {
            admin,
            path,
            filters,
        }
    }

    pub fn email(&mut self, email: impl Into<String>) -> &mut Self {
        self.filters.email = Some(email.into());
        self
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.filters.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u32) -> &mut Self {
        self.filters.offset = Some(offset);
        self
    }

    /// Set the offset to the start of 1-based page `page`.
    pub fn page(&mut self, page: u32) -> &mut Self {
        self.filters.offset = Some(page_offset(page, self.filters.limit));
        self
    }

    /// Filters accumulated so far.
    pub fn filters(&self) -> &UserFilters {
        &self.filters
    }

    /// Request path including the query string.
    pub fn path(&self) -> String {
        with_query(
            &self.path,
            &[
                ("email", non_empty(&self.filters.email)),
                ("limit", non_zero(self.filters.limit)),
                ("offset", non_zero(self.filters.offset)),
            ],
        )
    }

    /// Execute the query. Every call issues a new request.
    pub async fn send(&self) -> Result<Vec<User>> {
        let path = self.path();
        tracing::debug!(path = %path, "Listing users");
        self.admin
            .http_client()
            .request_json::<_, ()>(Method::GET, &path, None)
            .await
    }
}

/// Pending `GET` of the conversation collection.
#[must_use = "a list query does nothing until `send` is awaited"]
pub struct ConversationListQuery {
    admin: Arc<dyn AdminCore>,
    path: String,
    filters: ConversationFilters,
}

impl ConversationListQuery {
    pub(crate) fn new(
        admin: Arc<dyn AdminCore>,
        path: String,
        filters: ConversationFilters,
    ) -> Self {
        Self {
            admin,
            path,
            filters,
        }
    }

    /// Only conversations `user_id` is a member of.
    pub fn user_id(&mut self, user_id: impl Into<String>) -> &mut Self {
        self.filters.user_id = Some(user_id.into());
        self
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.filters.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u32) -> &mut Self {
        self.filters.offset = Some(offset);
        self
    }

    /// Set the offset to the start of 1-based page `page`.
    pub fn page(&mut self, page: u32) -> &mut Self {
        self.filters.offset = Some(page_offset(page, self.filters.limit));
        self
    }

    pub fn filters(&self) -> &ConversationFilters {
        &self.filters
    }

    pub fn path(&self) -> String {
        with_query(
            &self.path,
            &[
                ("userId", non_empty(&self.filters.user_id)),
                ("limit", non_zero(self.filters.limit)),
                ("offset", non_zero(self.filters.offset)),
            ],
        )
    }

    /// Execute the query. Every call issues a new request.
    pub async fn send(&self) -> Result<Vec<Conversation>> {
        let path = self.path();
        tracing::debug!(path = %path, "Listing conversations");
        self.admin
            .http_client()
            .request_json::<_, ()>(Method::GET, &path, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paanj_admin::MockAdmin;

    fn conversations(mock: &MockAdmin) -> ConversationListQuery {
        ConversationListQuery::new(
            Arc::new(mock.clone()),
            "/admin/conversations".to_string(),
            ConversationFilters::default(),
        )
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, None), 0);
        assert_eq!(page_offset(3, None), 100);
        assert_eq!(page_offset(2, Some(10)), 10);
        assert_eq!(page_offset(2, Some(0)), 50);
        assert_eq!(page_offset(0, Some(10)), 0);
    }

    #[test]
    fn test_no_filters_no_query_string() {
        let mock = MockAdmin::new();
        assert_eq!(conversations(&mock).path(), "/admin/conversations");
    }

    #[test]
    fn test_chain_order_is_irrelevant() {
        let mock = MockAdmin::new();
        let mut query = conversations(&mock);
        query.limit(10).page(2).user_id("u1");
        assert_eq!(query.path(), "/admin/conversations?userId=u1&limit=10&offset=10");
    }

    #[test]
    fn test_zero_and_empty_values_are_omitted() {
        let mock = MockAdmin::new();
        let mut query = UserListQuery::new(
            Arc::new(mock),
            "/admin/users".to_string(),
            UserFilters::default(),
        );
        query.email("").limit(0).offset(0);
        assert_eq!(query.path(), "/admin/users");

        query.email("a+b@c.com");
        assert_eq!(query.path(), "/admin/users?email=a%2Bb%40c.com");
    }

    #[test]
    fn test_page_uses_limit_set_so_far() {
        let mock = MockAdmin::new();
        let mut query = conversations(&mock);
        // page before limit falls back to the default page size
        query.page(2).limit(10);
        assert_eq!(query.filters().offset, Some(50));
    }
}
