//! WebSocket adapter — implements `ConnectionPort` with gloo-net.
//!
//! The socket is split: a forwarding task owns the write half and drains an
//! outbound queue, while the read half becomes the connection's event
//! stream. Frames queued before the handshake completes are held by the
//! socket until it opens.

use futures::channel::mpsc;
use futures::stream::{self, StreamExt};
use futures::SinkExt;
use gloo_net::websocket::{futures::WebSocket, Message, WebSocketError};
use wasm_bindgen_futures::spawn_local;

use relay_core::ports::{CommandSink, Connection, ConnectionPort, TransportEvent};
use relay_types::{protocol::ClientCommand, ClientError, Result};

/// Work items for the forwarding task
enum Outbound {
    /// JSON-serialized command
    Text(String),
    Close,
}

/// Outbound half handed to the controller
pub struct WebSocketSink {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl CommandSink for WebSocketSink {
    fn send(&self, command: &ClientCommand) -> Result<()> {
        let json = serde_json::to_string(command)?;
        self.tx
            .unbounded_send(Outbound::Text(json))
            .map_err(|_| ClientError::Transport("connection is closed".to_string()))
    }

    fn close(&self) {
        // Already gone if the forwarding task exited
        let _ = self.tx.unbounded_send(Outbound::Close);
        self.tx.close_channel();
    }
}

/// Opens browser WebSockets to the session endpoint
#[derive(Debug, Default, Clone)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

/// Endpoint URL with the workspace as a query parameter
pub fn socket_url(endpoint: &str, workspace: &str) -> String {
    let workspace = String::from(js_sys::encode_uri_component(workspace));
    format!("{}?workspace={}", endpoint, workspace)
}

fn transport_event(item: std::result::Result<Message, WebSocketError>) -> TransportEvent {
    match item {
        Ok(Message::Text(text)) => TransportEvent::Frame(text),
        // The backend only speaks text; undecodable bytes are dropped later
        Ok(Message::Bytes(bytes)) => {
            TransportEvent::Frame(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(WebSocketError::ConnectionClose(event)) => TransportEvent::Closed {
            clean: event.was_clean,
            code: event.code,
            reason: event.reason,
        },
        Err(WebSocketError::ConnectionError) => {
            TransportEvent::Error("WebSocket connection error".to_string())
        }
        Err(e) => TransportEvent::Error(e.to_string()),
    }
}

impl ConnectionPort for WebSocketConnector {
    fn connect(&self, url: &str, workspace: &str) -> Result<Connection> {
        let url = socket_url(url, workspace);
        let socket =
            WebSocket::open(&url).map_err(|e| ClientError::Transport(e.to_string()))?;
        log::info!("WebSocket opening: {}", url);

        let (mut write, read) = socket.split();
        let (tx, mut rx) = mpsc::unbounded::<Outbound>();

        spawn_local(async move {
            while let Some(item) = rx.next().await {
                match item {
                    Outbound::Text(json) => {
                        if let Err(e) = write.send(Message::Text(json)).await {
                            log::warn!("WebSocket send failed: {}", e);
                            break;
                        }
                    }
                    Outbound::Close => break,
                }
            }
            if let Err(e) = write.close().await {
                log::debug!("WebSocket close: {}", e);
            }
        });

        let events = stream::once(async { TransportEvent::Opened }).chain(read.map(transport_event));

        Ok(Connection {
            sink: Box::new(WebSocketSink { tx }),
            events: Box::pin(events),
        })
    }
}
