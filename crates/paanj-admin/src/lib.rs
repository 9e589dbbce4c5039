//! Admin core for the Paanj platform.
//!
//! This crate owns everything below the resource layer of the admin SDKs:
//!
//! - [`HttpClient`] / [`AdminCore`]: the interfaces resources are written against
//! - [`PaanjAdmin`]: the concrete core (reqwest for HTTP, a WebSocket event channel)
//! - [`EventEmitter`]: named-event listener registry fed by the event channel
//! - [`AdminConfig`]: TOML + environment configuration
//! - [`MockAdmin`]: an in-memory core for tests
//!
//! # Example
//!
//! ```no_run
//! use paanj_admin::{AdminConfig, AdminCore, AdminSubscription, PaanjAdmin};
//! use std::sync::Arc;
//!
//! # async fn example() -> paanj_admin::Result<()> {
//! let admin = PaanjAdmin::from_config(&AdminConfig::load()?)?;
//! admin.connect().await?;
//!
//! admin.subscribe(AdminSubscription::global("user.create"))?;
//! let listener = admin.on("user.create", Arc::new(|data: serde_json::Value| println!("{}", data)));
//!
//! // ...
//! listener.unsubscribe();
//! admin.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod mock;
pub mod protocol;
pub mod transport;

pub use client::{AdminBuilder, AdminHttpClient, PaanjAdmin};
pub use config::AdminConfig;
pub use connection::ConnectionStatus;
pub use error::{Error, Result};
pub use events::{EventCallback, EventEmitter, Unsubscribe};
pub use mock::{MockAdmin, RecordedRequest};
pub use protocol::{
    AdminEvent, AdminSubscribed, AdminSubscription, ServerMessage, SubscriptionKind,
    SubscriptionScope, scoped_event_key,
};
pub use transport::{AdminCore, HttpClient, HttpClientExt};

// Re-exported so downstream crates name methods without depending on reqwest.
pub use reqwest::Method;
