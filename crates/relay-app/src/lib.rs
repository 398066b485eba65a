//! Relay App — WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the browser adapters around a session controller and
//! exposes the result to the host shell through wasm-bindgen.

mod session;

pub use session::TranscriptSession;

use wasm_bindgen::prelude::*;

/// Runs once when the module loads.
#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Relay transcript client starting...");
}
