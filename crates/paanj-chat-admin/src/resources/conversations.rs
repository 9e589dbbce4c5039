//! Conversations API.

use std::collections::HashMap;
use std::sync::Arc;

use paanj_admin::{
    AdminCore, AdminSubscription, HttpClientExt, Method, Result, SubscriptionScope, Unsubscribe,
    scoped_event_key,
};
use serde_json::Value;

use super::item_path;
use crate::query::ConversationListQuery;
use crate::subscriptions::Subscriber;
use crate::types::{
    AddParticipantRequest, Conversation, ConversationFilters, CreateConversationData, Message,
    SendMessageData, UpdateConversationData,
};

/// Conversations API client.
pub struct ConversationsResource {
    admin: Arc<dyn AdminCore>,
    subscriber: Subscriber,
    base_path: String,
}

impl ConversationsResource {
    pub(crate) fn new(admin: Arc<dyn AdminCore>, subscriber: Subscriber, base_path: String) -> Self {
        Self {
            admin,
            subscriber,
            base_path,
        }
    }

    fn conversation_path(&self, conversation_id: &str) -> Result<String> {
        item_path(&self.base_path, conversation_id)
    }

    /// Create a conversation with its initial members.
    pub async fn create(&self, data: &CreateConversationData) -> Result<Conversation> {
        tracing::debug!(members = data.member_ids.len(), "Creating conversation");
        self.admin
            .http_client()
            .request_json(Method::POST, &self.base_path, Some(data))
            .await
    }

    /// Get a conversation by ID.
    pub async fn get(&self, conversation_id: &str) -> Result<Conversation> {
        self.admin
            .http_client()
            .request_json::<_, ()>(Method::GET, &self.conversation_path(conversation_id)?, None)
            .await
    }

    /// Update a conversation.
    pub async fn update(
        &self,
        conversation_id: &str,
        updates: &UpdateConversationData,
    ) -> Result<Conversation> {
        tracing::debug!(conversation_id, "Updating conversation");
        self.admin
            .http_client()
            .request_json(Method::PATCH, &self.conversation_path(conversation_id)?, Some(updates))
            .await
    }

    /// Delete a conversation.
    pub async fn delete(&self, conversation_id: &str) -> Result<()> {
        tracing::debug!(conversation_id, "Deleting conversation");
        self.admin
            .http_client()
            .request_unit::<()>(Method::DELETE, &self.conversation_path(conversation_id)?, None)
            .await
    }

    /// Start a list query seeded with `filters`.
    pub fn list(&self, filters: ConversationFilters) -> ConversationListQuery {
        ConversationListQuery::new(Arc::clone(&self.admin), self.base_path.clone(), filters)
    }

    pub fn on_create<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("conversation.create", callback)
    }

    pub fn on_update<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("conversation.update", callback)
    }

    pub fn on_delete<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("conversation.delete", callback)
    }

    /// Operations scoped to one conversation.
    pub fn conversation(&self, conversation_id: impl Into<String>) -> ConversationHandle {
        let conversation_id = conversation_id.into();
        ConversationHandle {
            admin: Arc::clone(&self.admin),
            subscriber: self.subscriber.clone(),
            base_path: self.base_path.clone(),
            conversation_id,
        }
    }
}

/// A single conversation: messages, participants and its message stream.
#[derive(Clone)]
pub struct ConversationHandle {
    admin: Arc<dyn AdminCore>,
    subscriber: Subscriber,
    conversation_id: String,
    base_path: String,
}

impl ConversationHandle {
    pub fn id(&self) -> &str {
        &self.conversation_id
    }

    fn path(&self, suffix: &str) -> Result<String> {
        Ok(format!("{}/{}", item_path(&self.base_path, &self.conversation_id)?, suffix))
    }

    /// Send a message into this conversation.
    pub async fn send(
        &self,
        content: impl Into<String>,
        metadata: Option<HashMap<String, Value>>,
    ) -> Result<Message> {
        let body = SendMessageData {
            content: content.into(),
            metadata,
        };
        tracing::debug!(conversation_id = %self.conversation_id, "Sending message");
        self.admin
            .http_client()
            .request_json(Method::POST, &self.path("messages")?, Some(&body))
            .await
    }

    pub async fn add_participant(&self, user_id: &str) -> Result<()> {
        tracing::debug!(conversation_id = %self.conversation_id, user_id, "Adding participant");
        self.admin
            .http_client()
            .request_unit(
                Method::POST,
                &self.path("participants")?,
                Some(&AddParticipantRequest { user_id }),
            )
            .await
    }

    pub async fn remove_participant(&self, user_id: &str) -> Result<()> {
        tracing::debug!(conversation_id = %self.conversation_id, user_id, "Removing participant");
        self.admin
            .http_client()
            .request_unit::<()>(
                Method::DELETE,
                &item_path(&self.path("participants")?, user_id)?,
                None,
            )
            .await
    }

    /// Listen to new messages in this conversation only.
    pub fn on_message<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let scope = SubscriptionScope::Conversation;
        let event = "message.create";
        let key = scoped_event_key(scope.as_str(), &self.conversation_id, event);
        self.subscriber.listen(
            AdminSubscription::scoped(scope, self.conversation_id.as_str(), event),
            &key,
            Arc::new(callback),
        )
    }
}

impl std::fmt::Debug for ConversationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationHandle")
            .field("conversation_id", &self.conversation_id)
            .field("base_path", &self.base_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paanj_admin::{AdminEvent, MockAdmin};
    use parking_lot::Mutex;
    use serde_json::json;

    fn resource(mock: &MockAdmin) -> ConversationsResource {
        let admin: Arc<dyn AdminCore> = Arc::new(mock.clone());
        let subscriber = Subscriber::new(Arc::clone(&admin), false);
        ConversationsResource::new(admin, subscriber, "/admin/conversations".to_string())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let mock = MockAdmin::new();
        mock.push_response(json!({"id": "c1", "name": "Team", "members": []}));
        mock.push_response(json!({"id": "c1"}));
        let conversations = resource(&mock);

        let created = conversations
            .create(&CreateConversationData::new(["u1", "u2"]).with_name("Team"))
            .await
            .unwrap();
        assert_eq!(created.name.as_deref(), Some("Team"));

        let fetched = conversations.get("c1").await.unwrap();
        assert_eq!(fetched.id, "c1");

        let requests = mock.requests();
        assert_eq!(requests[0].path, "/admin/conversations");
        assert_eq!(requests[0].body.as_ref().unwrap()["memberIds"], json!(["u1", "u2"]));
        assert_eq!(requests[1].path, "/admin/conversations/c1");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let mock = MockAdmin::new();
        mock.push_response(json!({"id": "c1", "name": "X"}));
        let conversations = resource(&mock);

        let updated = conversations
            .update(
                "c1",
                &UpdateConversationData {
                    name: Some("X".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("X"));
        conversations.delete("c1").await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::PATCH);
        assert_eq!(requests[0].path, "/admin/conversations/c1");
        assert_eq!(requests[0].body, Some(json!({"name": "X"})));
        assert_eq!(requests[1].method, Method::DELETE);
        assert_eq!(requests[1].path, "/admin/conversations/c1");
        assert_eq!(requests[1].body, None);
    }

    #[tokio::test]
    async fn test_handle_paths_encode_ids() {
        let mock = MockAdmin::new();
        let handle = resource(&mock).conversation("team/a");

        handle.remove_participant("u 1").await.unwrap();
        let err = resource(&mock).conversation("..").add_participant("u1").await.unwrap_err();
        assert!(matches!(err, paanj_admin::Error::InvalidArgument(_)));

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/admin/conversations/team%2Fa/participants/u%201");
    }

    #[tokio::test]
    async fn test_send_message() {
        let mock = MockAdmin::new();
        mock.push_response(json!({
            "id": "m1",
            "conversationId": "c1",
            "sender": "admin",
            "content": "hello",
            "timestamp": 1
        }));

        let mut metadata = HashMap::new();
        metadata.insert("priority".to_string(), json!("high"));
        let message = resource(&mock)
            .conversation("c1")
            .send("hello", Some(metadata))
            .await
            .unwrap();
        assert_eq!(message.content, "hello");

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/admin/conversations/c1/messages");
        assert_eq!(
            request.body,
            Some(json!({"content": "hello", "metadata": {"priority": "high"}}))
        );
    }

    #[tokio::test]
    async fn test_participants() {
        let mock = MockAdmin::new();
        let handle = resource(&mock).conversation("c1");

        handle.add_participant("u3").await.unwrap();
        handle.remove_participant("u3").await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/admin/conversations/c1/participants");
        assert_eq!(requests[0].body, Some(json!({"userId": "u3"})));
        assert_eq!(requests[1].method, Method::DELETE);
        assert_eq!(requests[1].path, "/admin/conversations/c1/participants/u3");
        assert_eq!(requests[1].body, None);
    }

    #[test]
    fn test_on_message_is_scoped_to_conversation() {
        let mock = MockAdmin::new();
        let conversations = resource(&mock);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _listener = conversations
            .conversation("c1")
            .on_message(move |data| sink.lock().push(data))
            .unwrap();

        assert_eq!(
            mock.subscriptions(),
            vec![AdminSubscription::scoped(
                SubscriptionScope::Conversation,
                "c1",
                "message.create"
            )]
        );
        assert_eq!(
            mock.events().listener_count("conversation:c1:message.create"),
            1
        );

        mock.emit_event(&AdminEvent::scoped(
            SubscriptionScope::Conversation,
            "c2",
            "message.create",
            json!({"id": "m2"}),
        ));
        assert!(seen.lock().is_empty());

        mock.emit_event(&AdminEvent::scoped(
            SubscriptionScope::Conversation,
            "c1",
            "message.create",
            json!({"id": "m1"}),
        ));
        assert_eq!(seen.lock().as_slice(), &[json!({"id": "m1"})]);
    }

    #[test]
    fn test_global_conversation_events() {
        let mock = MockAdmin::new();
        let conversations = resource(&mock);
        let _a = conversations.on_create(|_| {}).unwrap();
        let _b = conversations.on_update(|_| {}).unwrap();
        let _c = conversations.on_delete(|_| {}).unwrap();

        let events: Vec<String> = mock
            .subscriptions()
            .into_iter()
            .flat_map(|s| s.events)
            .collect();
        assert_eq!(
            events,
            vec!["conversation.create", "conversation.update", "conversation.delete"]
        );
    }
}
