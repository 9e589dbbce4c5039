//! WebSocket event channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::error::{Error, Result};
use crate::events::EventEmitter;
use crate::protocol::{AdminSubscription, ServerMessage};

/// Connection status of the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No event channel is open.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Connected and dispatching events.
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting..."),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Status publisher for one connection attempt.
///
/// Every `connect` starts a new generation. A stale generation can no longer
/// publish, so a closing socket cannot overwrite the state of its successor.
#[derive(Debug, Clone)]
pub(crate) struct StatusHandle {
    tx: watch::Sender<ConnectionStatus>,
    current: Arc<AtomicU64>,
    generation: u64,
}

impl StatusHandle {
    /// Start a new generation and publish `Connecting`.
    pub(crate) fn begin(tx: &watch::Sender<ConnectionStatus>, current: &Arc<AtomicU64>) -> Self {
        let mut generation = 0;
        // Bumped under the watch lock so it orders with every publish.
        tx.send_modify(|status| {
            generation = current.fetch_add(1, Ordering::SeqCst) + 1;
            *status = ConnectionStatus::Connecting;
        });
        Self {
            tx: tx.clone(),
            current: Arc::clone(current),
            generation,
        }
    }

    /// Publish `status` if this is still the current generation.
    pub(crate) fn publish(&self, status: ConnectionStatus) -> bool {
        let mut published = false;
        self.tx.send_if_modified(|value| {
            published = self.current.load(Ordering::SeqCst) == self.generation;
            if published {
                *value = status;
            }
            published
        });
        published
    }
}

/// Retire the current generation and publish `Disconnected`.
pub(crate) fn supersede(tx: &watch::Sender<ConnectionStatus>, current: &AtomicU64) {
    tx.send_modify(|status| {
        current.fetch_add(1, Ordering::SeqCst);
        *status = ConnectionStatus::Disconnected;
    });
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Open the socket, authenticating the handshake with the secret key.
pub(crate) async fn open(ws_url: &Url, secret_key: &str) -> Result<WsStream> {
    let mut request = ws_url.as_str().into_client_request()?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", secret_key))
        .map_err(|_| Error::Config("Invalid secret key".to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);

    tracing::info!(url = %ws_url, "Connecting event channel");
    let (stream, _) = connect_async(request).await?;
    tracing::info!("Event channel connected");
    Ok(stream)
}

/// Pump outbound control messages and inbound events until either side closes.
///
/// The outbound queue closing is a clean shutdown: a close frame is sent
/// before returning.
pub(crate) async fn run(
    stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<AdminSubscription>,
    emitter: EventEmitter,
    status: StatusHandle,
) {
    let (mut ws_sink, mut ws_stream) = stream.split();

    loop {
        tokio::select! {
            msg = outbound.recv() => match msg {
                Some(subscription) => {
                    let json = match serde_json::to_string(&subscription) {
                        Ok(j) => j,
                        Err(e) => {
                            tracing::error!("Failed to serialize subscription: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                        tracing::error!("Failed to send control message: {}", e);
                        break;
                    }
                }
                None => {
                    tracing::info!("Closing event channel");
                    let _ = ws_sink.send(Message::Close(None)).await;
                    break;
                }
            },

            frame = ws_stream.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_text(&text, &emitter),
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws_sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed event channel");
                    break;
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!("Unexpected binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            },
        }
    }

    if !status.publish(ConnectionStatus::Disconnected) {
        tracing::debug!("Superseded connection closed");
    }
}

/// Parse one text frame and dispatch it.
fn handle_text(text: &str, emitter: &EventEmitter) {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(ServerMessage::Event(event)) => {
            emitter.dispatch(&event);
        }
        Ok(ServerMessage::Subscribed(ack)) => {
            tracing::debug!(resource = %ack.resource, id = ?ack.id, events = ?ack.events, "Subscription confirmed");
        }
        Err(e) => {
            tracing::warn!("Failed to parse server message: {} - {}", e, text);
        }
    }
}

/// Derive the event channel URL from the HTTP API URL.
pub fn http_to_ws_url(http_url: &Url) -> Result<Url> {
    let mut url = http_url.clone();

    let new_scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::Config(format!("Unsupported URL scheme: {}", other)));
        }
    };

    url.set_scheme(new_scheme)
        .map_err(|_| Error::Config("Failed to set scheme".to_string()))?;
    url.set_path("/ws");

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::sync::Arc;

    #[test]
    fn test_http_to_ws_url() {
        let cases = [
            ("http://localhost:8080", "ws://localhost:8080/ws"),
            ("https://api.example.com", "wss://api.example.com/ws"),
            ("http://localhost:8080/api", "ws://localhost:8080/ws"),
            ("ws://localhost:8080", "ws://localhost:8080/ws"),
        ];
        for (input, expected) in cases {
            let url = Url::parse(input).unwrap();
            assert_eq!(http_to_ws_url(&url).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn test_http_to_ws_url_rejects_other_schemes() {
        let url = Url::parse("ftp://example.com").unwrap();
        assert!(matches!(http_to_ws_url(&url), Err(Error::Config(_))));
    }

    #[test]
    fn test_stale_generation_cannot_publish() {
        let (tx, rx) = watch::channel(ConnectionStatus::Disconnected);
        let current = Arc::new(AtomicU64::new(0));

        let first = StatusHandle::begin(&tx, &current);
        assert!(first.publish(ConnectionStatus::Connected));

        // disconnect() then connect() before the first socket winds down
        supersede(&tx, &current);
        assert_eq!(*rx.borrow(), ConnectionStatus::Disconnected);
        let second = StatusHandle::begin(&tx, &current);
        assert!(second.publish(ConnectionStatus::Connected));

        assert!(!first.publish(ConnectionStatus::Disconnected));
        assert_eq!(*rx.borrow(), ConnectionStatus::Connected);

        assert!(second.publish(ConnectionStatus::Disconnected));
        assert_eq!(*rx.borrow(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_disconnect_during_handshake_blocks_connected() {
        let (tx, rx) = watch::channel(ConnectionStatus::Disconnected);
        let current = Arc::new(AtomicU64::new(0));

        let attempt = StatusHandle::begin(&tx, &current);
        assert_eq!(*rx.borrow(), ConnectionStatus::Connecting);
        supersede(&tx, &current);

        assert!(!attempt.publish(ConnectionStatus::Connected));
        assert_eq!(*rx.borrow(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_connection_status_display() {
        assert_eq!(ConnectionStatus::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionStatus::Connecting.to_string(), "connecting...");
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
    }

    #[test]
    fn test_handle_text_dispatches_events() {
        let emitter = EventEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _h = emitter.on(
            "user.delete",
            Arc::new(move |data: Value| sink.lock().push(data)),
        );

        handle_text(
            r#"{"type":"admin.event","event":"user.delete","resource":"global","resourceId":"","data":{"userId":"u9"}}"#,
            &emitter,
        );
        handle_text("not json", &emitter);
        handle_text(r#"{"type":"admin.subscribed","resource":"global","events":["user.delete"]}"#, &emitter);

        assert_eq!(seen.lock().as_slice(), &[json!({"userId": "u9"})]);
    }
}
