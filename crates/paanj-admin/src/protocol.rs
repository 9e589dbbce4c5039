//! Event channel protocol types.
//!
//! Control messages flow client → server as [`AdminSubscription`]; the server
//! pushes [`ServerMessage`] frames back, tagged on their `type` field.

use serde::{Deserialize, Serialize};

/// Direction of a subscription control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionKind {
    #[serde(rename = "admin.subscribe")]
    Subscribe,
    #[serde(rename = "admin.unsubscribe")]
    Unsubscribe,
}

/// Resource scope a subscription applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionScope {
    /// Every resource of the platform.
    Global,
    /// A single conversation, identified by `id`.
    Conversation,
    /// A single user, identified by `id`.
    User,
}

impl SubscriptionScope {
    /// Wire name of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Conversation => "conversation",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for SubscriptionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscribe/unsubscribe control message sent over the event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSubscription {
    #[serde(rename = "type")]
    pub kind: SubscriptionKind,
    pub resource: SubscriptionScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub events: Vec<String>,
}

impl AdminSubscription {
    /// Subscribe to a single event across the whole platform.
    pub fn global(event: impl Into<String>) -> Self {
        Self {
            kind: SubscriptionKind::Subscribe,
            resource: SubscriptionScope::Global,
            id: None,
            events: vec![event.into()],
        }
    }

    /// Subscribe to a single event of one resource instance.
    pub fn scoped(scope: SubscriptionScope, id: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            kind: SubscriptionKind::Subscribe,
            resource: scope,
            id: Some(id.into()),
            events: vec![event.into()],
        }
    }

    /// The matching unsubscribe message for this subscription.
    pub fn to_unsubscribe(&self) -> Self {
        Self {
            kind: SubscriptionKind::Unsubscribe,
            ..self.clone()
        }
    }
}

/// Event envelope pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEvent {
    /// Dotted event name, e.g. `user.create`.
    pub event: String,
    /// Resource scope the event was delivered for.
    #[serde(default)]
    pub resource: String,
    /// Identifier of the scoped resource, empty for global deliveries.
    #[serde(default)]
    pub resource_id: String,
    /// Event payload handed to callbacks.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl AdminEvent {
    /// Build an envelope for a global event.
    pub fn global(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            resource: SubscriptionScope::Global.as_str().to_string(),
            resource_id: String::new(),
            data,
        }
    }

    /// Build an envelope scoped to one resource instance.
    pub fn scoped(
        scope: SubscriptionScope,
        id: impl Into<String>,
        event: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event: event.into(),
            resource: scope.as_str().to_string(),
            resource_id: id.into(),
            data,
        }
    }
}

/// Acknowledgement of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSubscribed {
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

/// Messages from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "admin.event")]
    Event(AdminEvent),
    #[serde(rename = "admin.subscribed")]
    Subscribed(AdminSubscribed),
}

/// Composite listener key for an event delivered to one resource instance.
pub fn scoped_event_key(resource: &str, id: &str, event: &str) -> String {
    format!("{}:{}:{}", resource, id, event)
}
