//! Concrete admin core.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use url::Url;

use crate::config::AdminConfig;
use crate::connection::{self, ConnectionStatus, StatusHandle};
use crate::error::{Error, ErrorResponse, Result};
use crate::events::{EventCallback, EventEmitter, Unsubscribe};
use crate::protocol::AdminSubscription;
use crate::transport::{AdminCore, HttpClient};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Paanj admin client.
///
/// Owns the HTTP client, the event channel and the listener registry. Clones
/// share all three.
///
/// # Example
///
/// ```no_run
/// use paanj_admin::PaanjAdmin;
///
/// # async fn example() -> paanj_admin::Result<()> {
/// let admin = PaanjAdmin::builder()
///     .secret_key("sk_live_key")
///     .api_url("https://api.example.com")
///     .build()?;
/// admin.connect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PaanjAdmin {
    inner: Arc<AdminInner>,
}

struct AdminInner {
    http: AdminHttpClient,
    ws_url: Url,
    secret_key: String,
    emitter: EventEmitter,
    outbound: Mutex<Option<mpsc::UnboundedSender<AdminSubscription>>>,
    status_tx: watch::Sender<ConnectionStatus>,
    status_rx: watch::Receiver<ConnectionStatus>,
    generation: Arc<AtomicU64>,
}

impl PaanjAdmin {
    /// Create a new client builder.
    pub fn builder() -> AdminBuilder {
        AdminBuilder::new()
    }

    /// Build a client from loaded configuration.
    pub fn from_config(config: &AdminConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .api_url(&config.api_url)
            .timeout(Duration::from_secs(config.timeout_secs));
        if let Some(key) = &config.secret_key {
            builder = builder.secret_key(key);
        }
        if let Some(ws_url) = &config.ws_url {
            builder = builder.ws_url(ws_url);
        }
        builder.build()
    }

    /// Base URL of the HTTP API.
    pub fn api_url(&self) -> &Url {
        &self.inner.http.base_url
    }

    /// URL of the event channel.
    pub fn ws_url(&self) -> &Url {
        &self.inner.ws_url
    }

    /// The HTTP client used for request/response calls.
    pub fn http(&self) -> &AdminHttpClient {
        &self.inner.http
    }

    /// Current event channel status.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status_rx.borrow()
    }

    /// Watch event channel status changes.
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_rx.clone()
    }

    /// Open the event channel.
    ///
    /// Calling this while already connected is a no-op.
    pub async fn connect(&self) -> Result<()> {
        if self.inner.outbound.lock().is_some() && self.status() == ConnectionStatus::Connected {
            return Ok(());
        }

        let status = StatusHandle::begin(&self.inner.status_tx, &self.inner.generation);
        let stream = match connection::open(&self.inner.ws_url, &self.inner.secret_key).await {
            Ok(stream) => stream,
            Err(e) => {
                status.publish(ConnectionStatus::Disconnected);
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut outbound = self.inner.outbound.lock();
            if !status.publish(ConnectionStatus::Connected) {
                tracing::info!("Disconnected during handshake");
                return Err(Error::NotConnected);
            }
            *outbound = Some(tx);
        }

        tokio::spawn(connection::run(stream, rx, self.inner.emitter.clone(), status));
        Ok(())
    }

    /// Close the event channel.
    ///
    /// Status reads `Disconnected` immediately. Registered listeners are
    /// kept; they simply stop receiving events.
    pub fn disconnect(&self) {
        let mut outbound = self.inner.outbound.lock();
        connection::supersede(&self.inner.status_tx, &self.inner.generation);
        if outbound.take().is_some() {
            tracing::info!("Disconnect requested");
        }
    }

    /// The listener registry events are dispatched to.
    pub fn events(&self) -> &EventEmitter {
        &self.inner.emitter
    }
}

impl AdminCore for PaanjAdmin {
    fn http_client(&self) -> &dyn HttpClient {
        &self.inner.http
    }

    fn subscribe(&self, subscription: AdminSubscription) -> Result<()> {
        let guard = self.inner.outbound.lock();
        let tx = guard.as_ref().ok_or(Error::NotConnected)?;
        tracing::debug!(
            kind = ?subscription.kind,
            resource = %subscription.resource,
            id = ?subscription.id,
            events = ?subscription.events,
            "Sending subscription"
        );
        tx.send(subscription).map_err(|_| Error::NotConnected)
    }

    fn on(&self, event: &str, callback: EventCallback) -> Unsubscribe {
        self.inner.emitter.on(event, callback)
    }
}

impl std::fmt::Debug for PaanjAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaanjAdmin")
            .field("api_url", &self.inner.http.base_url.as_str())
            .field("ws_url", &self.inner.ws_url.as_str())
            .field("status", &self.status())
            .finish()
    }
}

/// HTTP half of the admin core.
pub struct AdminHttpClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl AdminHttpClient {
    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.base_url.join(path).map_err(Error::from)
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            Ok(Value::Null)
        } else {
            Ok(serde_json::from_slice(&bytes)?)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(err) => {
                let message = err.message.unwrap_or_else(|| format!("HTTP {}", status));
                if status == 404 {
                    Error::NotFound(message)
                } else if status == 401 {
                    Error::Auth(message)
                } else {
                    Error::Api {
                        status,
                        code: err.code.unwrap_or_else(|| "unknown".to_string()),
                        message,
                    }
                }
            }
            Err(_) => match status {
                404 => Error::NotFound(format!("HTTP {}", status)),
                401 => Error::Auth(format!("HTTP {}", status)),
                _ => Error::Api {
                    status,
                    code: "unknown".to_string(),
                    message: format!("HTTP {}", status),
                },
            },
        }
    }
}

#[async_trait]
impl HttpClient for AdminHttpClient {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url(path)?;
        tracing::debug!(method = %method, url = %url, "Sending request");

        let mut request = self
            .http
            .request(method, url)
            .timeout(self.timeout);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }
}

/// Builder for creating a [`PaanjAdmin`].
#[derive(Debug)]
pub struct AdminBuilder {
    secret_key: Option<String>,
    api_url: Option<String>,
    ws_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl AdminBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            secret_key: None,
            api_url: None,
            ws_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the admin secret key.
    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = Some(key.into());
        self
    }

    /// Set the HTTP API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the event channel URL (derived from the API URL when unset).
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PaanjAdmin> {
        let secret_key = self
            .secret_key
            .ok_or_else(|| Error::Config("secret_key is required".to_string()))?;

        let api_url = self
            .api_url
            .unwrap_or_else(|| crate::config::DEFAULT_API_URL.to_string());
        let mut base_url = Url::parse(&api_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let ws_url = match self.ws_url {
            Some(url) => Url::parse(&url)?,
            None => connection::http_to_ws_url(&base_url)?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let value = HeaderValue::from_str(&format!("Bearer {}", secret_key))
            .map_err(|_| Error::Config("Invalid secret key".to_string()))?;
        headers.insert(AUTHORIZATION, value);

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("paanj-admin/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

        Ok(PaanjAdmin {
            inner: Arc::new(AdminInner {
                http: AdminHttpClient {
                    http,
                    base_url,
                    timeout: self.timeout,
                },
                ws_url,
                secret_key,
                emitter: EventEmitter::new(),
                outbound: Mutex::new(None),
                status_tx,
                status_rx,
                generation: Arc::new(AtomicU64::new(0)),
            }),
        })
    }
}

impl Default for AdminBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> PaanjAdmin {
        PaanjAdmin::builder()
            .secret_key("sk_test")
            .api_url("http://localhost:8080")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_secret_key() {
        let result = AdminBuilder::new().api_url("http://localhost:8080").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let admin = admin();
        assert_eq!(admin.api_url().as_str(), "http://localhost:8080/");
        assert_eq!(admin.ws_url().as_str(), "ws://localhost:8080/ws");
    }

    #[test]
    fn test_builder_explicit_ws_url() {
        let admin = PaanjAdmin::builder()
            .secret_key("sk_test")
            .api_url("https://api.example.com")
            .ws_url("wss://events.example.com/socket")
            .build()
            .unwrap();
        assert_eq!(admin.ws_url().as_str(), "wss://events.example.com/socket");
    }

    #[test]
    fn test_url_building() {
        let admin = admin();
        let url = admin.http().url("/admin/users").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/admin/users");

        let url = admin.http().url("admin/users?limit=10").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/admin/users?limit=10");
    }

    #[test]
    fn test_url_building_keeps_base_path() {
        let admin = PaanjAdmin::builder()
            .secret_key("sk_test")
            .api_url("http://localhost:8080/v2")
            .build()
            .unwrap();
        let url = admin.http().url("/admin/users/u1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v2/admin/users/u1");
    }

    #[test]
    fn test_subscribe_requires_connection() {
        let admin = admin();
        assert_eq!(admin.status(), ConnectionStatus::Disconnected);
        let result = admin.subscribe(AdminSubscription::global("user.create"));
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[test]
    fn test_disconnect_when_idle_stays_disconnected() {
        let admin = admin();
        admin.disconnect();
        admin.disconnect();
        assert_eq!(admin.status(), ConnectionStatus::Disconnected);
        assert!(matches!(
            admin.subscribe(AdminSubscription::global("user.create")),
            Err(Error::NotConnected)
        ));
    }

    #[test]
    fn test_listeners_register_without_connection() {
        let admin = admin();
        let handle = admin.on("user.create", Arc::new(|_: Value| {}));
        assert_eq!(admin.events().listener_count("user.create"), 1);
        handle.unsubscribe();
        assert_eq!(admin.events().listener_count("user.create"), 0);
    }
}
