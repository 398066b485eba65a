//! Port traits — the hexagonal architecture boundary.
//!
//! These traits are defined here in `relay-core` (pure Rust).
//! Implementations live in `relay-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use relay_types::{
    history::{HistoryPage, HistoryRequest},
    protocol::ClientCommand,
    Result,
};

// ─── Connection Port ─────────────────────────────────────────

/// Signal from the duplex transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The socket finished its handshake
    Opened,
    /// One inbound text frame
    Frame(String),
    /// The socket closed; `clean` follows the transport's own notion
    Closed { clean: bool, code: u16, reason: String },
    /// The transport failed
    Error(String),
}

pub type TransportStream = Pin<Box<dyn Stream<Item = TransportEvent>>>;

/// Outbound half of an open connection
pub trait CommandSink {
    /// Queue one command frame. Fails only if the connection is gone.
    fn send(&self, command: &ClientCommand) -> Result<()>;

    /// Close the connection; further sends fail.
    fn close(&self);
}

/// An opened duplex connection: outbound sink plus inbound event stream
pub struct Connection {
    pub sink: Box<dyn CommandSink>,
    pub events: TransportStream,
}

pub trait ConnectionPort {
    /// Open a connection to the session endpoint for `workspace`.
    fn connect(&self, url: &str, workspace: &str) -> Result<Connection>;
}

// ─── History Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait HistoryPort {
    /// Fetch one page of older records for a session
    async fn fetch_page(&self, request: &HistoryRequest) -> Result<HistoryPage>;
}
