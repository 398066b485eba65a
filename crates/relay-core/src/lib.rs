//! Transcript reconstruction engine for streamed agent sessions.
//!
//! Platform-free: the browser adapters implement the traits in [`ports`].

pub mod assembler;
pub mod controller;
pub mod decoder;
pub mod dedup;
pub mod event_bus;
pub mod pagination;
pub mod pairing;
pub mod ports;
pub mod snapshot;
pub mod system_policy;


pub use controller::{load_older, pump, LiveConnection, ModelSwitch, SessionController};
pub use event_bus::EventBus;
