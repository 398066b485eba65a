//! Browser adapters for the relay-core ports.
//!
//! Everything here talks to the browser through gloo-net and is only
//! meaningful on wasm32.

pub mod history;
pub mod socket;

pub use history::HttpHistoryClient;
pub use socket::WebSocketConnector;
