//! Subscribe-then-register plumbing shared by every `on_*` method.

use std::collections::HashMap;
use std::sync::Arc;

use paanj_admin::{AdminCore, AdminSubscription, EventCallback, Result, SubscriptionScope, Unsubscribe};
use parking_lot::Mutex;
use serde_json::Value;

type LedgerKey = (SubscriptionScope, Option<String>, String);

/// Reference counts of live listeners per server-side subscription.
///
/// Only used when server subscriptions are released on last unsubscribe.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionLedger {
    counts: Mutex<HashMap<LedgerKey, usize>>,
}

impl SubscriptionLedger {
    fn key(subscription: &AdminSubscription) -> LedgerKey {
        (
            subscription.resource,
            subscription.id.clone(),
            subscription.events.join(","),
        )
    }

    fn acquire(&self, subscription: &AdminSubscription) {
        *self.counts.lock().entry(Self::key(subscription)).or_insert(0) += 1;
    }

    /// Returns true when this was the last live listener.
    fn release(&self, subscription: &AdminSubscription) -> bool {
        let mut counts = self.counts.lock();
        let key = Self::key(subscription);
        match counts.get_mut(&key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                counts.remove(&key);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn count(&self, subscription: &AdminSubscription) -> usize {
        self.counts
            .lock()
            .get(&Self::key(subscription))
            .copied()
            .unwrap_or(0)
    }
}

/// Sends subscription control messages and registers listeners.
#[derive(Clone)]
pub(crate) struct Subscriber {
    admin: Arc<dyn AdminCore>,
    ledger: Option<Arc<SubscriptionLedger>>,
}

impl Subscriber {
    pub(crate) fn new(admin: Arc<dyn AdminCore>, release_server_subscriptions: bool) -> Self {
        Self {
            admin,
            ledger: release_server_subscriptions.then(|| Arc::new(SubscriptionLedger::default())),
        }
    }

    /// Subscribe to a platform-wide event and listen on its plain name.
    pub(crate) fn global<F>(&self, event: &str, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.listen(AdminSubscription::global(event), event, Arc::new(callback))
    }

    /// Send `subscription`, then register `callback` under `key`.
    ///
    /// The callback is not registered if the control message cannot be sent.
    pub(crate) fn listen(
        &self,
        subscription: AdminSubscription,
        key: &str,
        callback: EventCallback,
    ) -> Result<Unsubscribe> {
        tracing::debug!(
            resource = %subscription.resource,
            id = ?subscription.id,
            events = ?subscription.events,
            "Subscribing"
        );
        // Count first so a concurrent last release cannot unsubscribe after
        // this subscribe reaches the server.
        if let Some(ledger) = &self.ledger {
            ledger.acquire(&subscription);
        }
        if let Err(e) = self.admin.subscribe(subscription.clone()) {
            if let Some(ledger) = &self.ledger {
                ledger.release(&subscription);
            }
            return Err(e);
        }
        let listener = self.admin.on(key, callback);

        let Some(ledger) = self.ledger.clone() else {
            return Ok(listener);
        };

        let admin = Arc::clone(&self.admin);
        Ok(Unsubscribe::new(move || {
            listener.unsubscribe();
            if ledger.release(&subscription) {
                let message = subscription.to_unsubscribe();
                tracing::debug!(resource = %message.resource, id = ?message.id, "Releasing server subscription");
                if let Err(e) = admin.subscribe(message) {
                    tracing::warn!(error = %e, "Failed to release server subscription");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paanj_admin::{AdminEvent, Error, HttpClient, MockAdmin, SubscriptionKind};
    use serde_json::json;

    type SubscribeHook = Box<dyn Fn(&AdminSubscription) -> Result<()> + Send + Sync>;

    /// Mock core that runs a hook before recording each subscription.
    struct HookedAdmin {
        mock: MockAdmin,
        hook: Mutex<Option<SubscribeHook>>,
    }

    impl AdminCore for HookedAdmin {
        fn http_client(&self) -> &dyn HttpClient {
            self.mock.http_client()
        }

        fn subscribe(&self, subscription: AdminSubscription) -> Result<()> {
            if let Some(hook) = self.hook.lock().as_ref() {
                hook(&subscription)?;
            }
            self.mock.subscribe(subscription)
        }

        fn on(&self, event: &str, callback: EventCallback) -> Unsubscribe {
            self.mock.on(event, callback)
        }
    }

    fn hooked(mock: &MockAdmin) -> (Arc<HookedAdmin>, Subscriber) {
        let admin = Arc::new(HookedAdmin {
            mock: mock.clone(),
            hook: Mutex::new(None),
        });
        let sub = Subscriber::new(Arc::clone(&admin) as Arc<dyn AdminCore>, true);
        (admin, sub)
    }

    fn subscriber(mock: &MockAdmin, release: bool) -> Subscriber {
        Subscriber::new(Arc::new(mock.clone()), release)
    }

    #[test]
    fn test_subscribe_before_register() {
        let mock = MockAdmin::new();
        let sub = subscriber(&mock, false);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = sub
            .global("user.create", move |data| sink.lock().push(data))
            .unwrap();

        assert_eq!(mock.subscriptions(), vec![AdminSubscription::global("user.create")]);
        mock.emit_event(&AdminEvent::global("user.create", json!({"userId": "u1"})));
        assert_eq!(seen.lock().len(), 1);

        handle.unsubscribe();
        mock.emit_event(&AdminEvent::global("user.create", json!({"userId": "u2"})));
        assert_eq!(seen.lock().len(), 1);
        // local-only by default
        assert_eq!(mock.subscriptions().len(), 1);
    }

    #[test]
    fn test_ledger_releases_on_last_unsubscribe() {
        let mock = MockAdmin::new();
        let sub = subscriber(&mock, true);

        let first = sub.global("message.create", |_| {}).unwrap();
        let second = sub.global("message.create", |_| {}).unwrap();
        assert_eq!(mock.subscriptions().len(), 2);

        first.unsubscribe();
        assert_eq!(mock.subscriptions().len(), 2);

        second.unsubscribe();
        let sent = mock.subscriptions();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].kind, SubscriptionKind::Unsubscribe);
        assert_eq!(sent[2].events, vec!["message.create".to_string()]);
    }

    #[test]
    fn test_ledger_counts_per_scope_and_id() {
        let ledger = SubscriptionLedger::default();
        let a = AdminSubscription::scoped(SubscriptionScope::Conversation, "c1", "message.create");
        let b = AdminSubscription::scoped(SubscriptionScope::Conversation, "c2", "message.create");

        ledger.acquire(&a);
        ledger.acquire(&a);
        ledger.acquire(&b);
        assert_eq!(ledger.count(&a), 2);
        assert_eq!(ledger.count(&b), 1);

        assert!(!ledger.release(&a));
        assert!(ledger.release(&b));
        assert!(ledger.release(&a));
        assert!(!ledger.release(&a));
    }

    #[test]
    fn test_listener_is_counted_before_subscribe_is_sent() {
        let mock = MockAdmin::new();
        let (admin, sub) = hooked(&mock);
        let ledger = sub.ledger.clone().unwrap();

        let counted_at_send = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&counted_at_send);
        *admin.hook.lock() = Some(Box::new(move |subscription: &AdminSubscription| {
            sink.lock().push(ledger.count(subscription));
            Ok(())
        }));

        let _first = sub.global("user.create", |_| {}).unwrap();
        let _second = sub.global("user.create", |_| {}).unwrap();
        assert_eq!(counted_at_send.lock().as_slice(), &[1, 2]);
    }

    #[test]
    fn test_failed_subscribe_rolls_back_count() {
        let mock = MockAdmin::new();
        let (admin, sub) = hooked(&mock);
        let subscription = AdminSubscription::global("user.delete");

        *admin.hook.lock() = Some(Box::new(|_: &AdminSubscription| Err(Error::NotConnected)));
        let err = sub.global("user.delete", |_| {}).unwrap_err();
        assert!(matches!(err, Error::NotConnected));
        assert_eq!(sub.ledger.as_ref().unwrap().count(&subscription), 0);
        assert_eq!(mock.events().listener_count("user.delete"), 0);

        *admin.hook.lock() = None;
        let handle = sub.global("user.delete", |_| {}).unwrap();
        handle.unsubscribe();
        let sent = mock.subscriptions();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].kind, SubscriptionKind::Unsubscribe);
    }
}
