//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use paanj_admin::{
    AdminCore, AdminSubscription, Error, EventCallback, EventEmitter, HttpClient, Method, Result,
    Unsubscribe,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// An admin core backed by an in-memory user store.
///
/// Understands the default user routes: create, get, update, delete.
/// Every other request resolves to `Value::Null`.
#[derive(Clone, Default)]
pub struct InMemoryAdmin {
    store: Arc<Store>,
    emitter: EventEmitter,
    subscriptions: Arc<Mutex<Vec<AdminSubscription>>>,
}

#[derive(Default)]
struct Store {
    users: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<(Method, String)>>,
}

impl InMemoryAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.store.users.lock().len()
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.store.requests.lock().clone()
    }

    pub fn subscriptions(&self) -> Vec<AdminSubscription> {
        self.subscriptions.lock().clone()
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }
}

fn not_found() -> Error {
    Error::NotFound("User not found".to_string())
}

#[async_trait]
impl HttpClient for Store {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        self.requests.lock().push((method.clone(), path.to_string()));

        let Some(rest) = path.strip_prefix("/admin/users") else {
            return Ok(Value::Null);
        };
        let id = rest.trim_start_matches('/');
        let mut users = self.users.lock();

        match (method, id.is_empty()) {
            (Method::POST, true) => {
                let mut user = body.unwrap_or_else(|| json!({}));
                let id = uuid::Uuid::new_v4().to_string();
                user["userId"] = json!(id.clone());
                user["createdAt"] = json!("2024-01-01T00:00:00Z");
                users.insert(id, user.clone());
                Ok(user)
            }
            (Method::GET, true) => Ok(Value::Array(users.values().cloned().collect())),
            (Method::GET, false) => users.get(id).cloned().ok_or_else(not_found),
            (Method::PATCH, false) => {
                let user = users.get_mut(id).ok_or_else(not_found)?;
                if let (Some(target), Some(Value::Object(updates))) = (user.as_object_mut(), body) {
                    target.extend(updates);
                }
                Ok(user.clone())
            }
            (Method::DELETE, false) => users.remove(id).map(|_| Value::Null).ok_or_else(not_found),
            _ => Ok(Value::Null),
        }
    }
}

impl AdminCore for InMemoryAdmin {
    fn http_client(&self) -> &dyn HttpClient {
        self.store.as_ref()
    }

    fn subscribe(&self, subscription: AdminSubscription) -> Result<()> {
        self.subscriptions.lock().push(subscription);
        Ok(())
    }

    fn on(&self, event: &str, callback: EventCallback) -> Unsubscribe {
        self.emitter.on(event, callback)
    }
}
