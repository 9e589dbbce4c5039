//! Message event streams.
//!
//! Messages have no CRUD surface of their own; they are created through
//! [`ConversationHandle::send`](crate::ConversationHandle::send).

use paanj_admin::{Result, Unsubscribe};
use serde_json::Value;

use crate::subscriptions::Subscriber;

/// Platform-wide message events.
pub struct MessagesResource {
    subscriber: Subscriber,
}

impl MessagesResource {
    pub(crate) fn new(subscriber: Subscriber) -> Self {
        Self { subscriber }
    }

    pub fn on_create<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("message.create", callback)
    }

    pub fn on_send<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("message.send", callback)
    }

    pub fn on_update<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("message.update", callback)
    }

    pub fn on_delete<F>(&self, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscriber.global("message.delete", callback)
    }
}
