//! Interfaces the admin core exposes to SDK resources.
//!
//! Resources never talk to the network directly: they go through
//! [`AdminCore::http_client`] for request/response calls and through
//! [`AdminCore::subscribe`] + [`AdminCore::on`] for pushed events.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::events::{EventCallback, Unsubscribe};
use crate::protocol::AdminSubscription;

/// Generic request/response transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue one HTTP call and resolve with the parsed JSON body.
    ///
    /// A successful response with an empty body resolves to `Value::Null`.
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value>;
}

/// A connected admin core.
pub trait AdminCore: Send + Sync {
    /// The shared HTTP client.
    fn http_client(&self) -> &dyn HttpClient;

    /// Send a subscription control message over the event channel.
    ///
    /// Does not wait for the server's acknowledgement.
    fn subscribe(&self, subscription: AdminSubscription) -> Result<()>;

    /// Register a callback for a named event.
    fn on(&self, event: &str, callback: EventCallback) -> Unsubscribe;
}

/// Typed convenience calls over an [`HttpClient`].
#[async_trait]
pub trait HttpClientExt: HttpClient {
    /// Send `body` (if any) and deserialize the response into `T`.
    async fn request_json<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        let value = self.request(method, path, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send `body` (if any) and discard the response body.
    async fn request_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        self.request(method, path, body).await?;
        Ok(())
    }
}

impl<H: HttpClient + ?Sized> HttpClientExt for H {}
