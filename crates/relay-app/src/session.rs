//! JS-facing transcript session. Wires the controller to the browser
//! adapters and hands the host shell a small imperative API.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use relay_core::event_bus::EventBus;
use relay_core::ports::{ConnectionPort, HistoryPort};
use relay_core::{load_older, pump, LiveConnection, ModelSwitch, SessionController};
use relay_platform::{HttpHistoryClient, WebSocketConnector};
use relay_types::{config::ClientConfig, ClientError};

fn to_js(error: ClientError) -> JsValue {
    log::error!("{}", error);
    JsValue::from_str(&error.to_string())
}

/// Host callback invoked whenever session state may have changed
#[derive(Clone, Default)]
struct Notifier {
    callback: Rc<RefCell<Option<Function>>>,
}

impl Notifier {
    fn set(&self, callback: Option<Function>) {
        *self.callback.borrow_mut() = callback;
    }

    fn notify(&self) {
        // Cloned out so the callback may replace itself
        let callback = self.callback.borrow().clone();
        if let Some(callback) = callback {
            if let Err(e) = callback.call0(&JsValue::NULL) {
                log::error!("Change callback threw: {:?}", e);
            }
        }
    }
}

/// One transcript view: one controller, one connection at a time.
#[wasm_bindgen]
pub struct TranscriptSession {
    controller: Rc<RefCell<SessionController>>,
    event_bus: EventBus,
    connector: Rc<dyn ConnectionPort>,
    history: Rc<dyn HistoryPort>,
    notifier: Notifier,
}

#[wasm_bindgen]
impl TranscriptSession {
    /// Build a session from a JSON `ClientConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<TranscriptSession, JsValue> {
        let config = ClientConfig::from_json(config_json).map_err(to_js)?;
        let event_bus = EventBus::new();
        let history: Rc<dyn HistoryPort> = Rc::new(HttpHistoryClient::new(config.clone()));
        let controller = SessionController::new(config, event_bus.clone()).map_err(to_js)?;

        Ok(Self {
            controller: Rc::new(RefCell::new(controller)),
            event_bus,
            connector: Rc::new(WebSocketConnector::new()),
            history,
            notifier: Notifier::default(),
        })
    }

    /// Register (or clear) the change callback.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Option<Function>) {
        self.notifier.set(callback);
    }

    pub fn open(&self) -> Result<(), JsValue> {
        let result = self
            .controller
            .borrow_mut()
            .connect(self.connector.as_ref());
        self.notifier.notify();
        self.spawn_pump(result.map_err(to_js)?);
        Ok(())
    }

    pub fn send(&self, text: &str) -> Result<(), JsValue> {
        let result = self.controller.borrow_mut().submit(text);
        self.notifier.notify();
        result.map_err(to_js)
    }

    pub fn interrupt(&self) {
        self.controller.borrow_mut().interrupt();
        self.notifier.notify();
    }

    /// Switch models, reopening the connection when needed.
    #[wasm_bindgen(js_name = selectModel)]
    pub fn select_model(&self, model: &str) -> Result<(), JsValue> {
        let switch = self.controller.borrow_mut().select_model(model);
        let reconnect = match switch.map_err(to_js)? {
            ModelSwitch::Unchanged => None,
            ModelSwitch::Reconnect { .. } => Some(
                self.controller
                    .borrow_mut()
                    .reconnect(self.connector.as_ref()),
            ),
        };
        self.notifier.notify();
        if let Some(result) = reconnect {
            self.spawn_pump(result.map_err(to_js)?);
        }
        Ok(())
    }

    /// Load the next page of older history. Resolves to the number of
    /// turns added.
    #[wasm_bindgen(js_name = loadOlder)]
    pub fn load_older(&self) -> Promise {
        let controller = self.controller.clone();
        let history = self.history.clone();
        let notifier = self.notifier.clone();

        future_to_promise(async move {
            let result = load_older(&controller, history.as_ref()).await;
            notifier.notify();
            match result {
                Ok(added) => Ok(JsValue::from(added as u32)),
                Err(e) => Err(to_js(e)),
            }
        })
    }

    pub fn close(&self) {
        self.controller.borrow_mut().close();
        self.notifier.notify();
    }

    #[wasm_bindgen(js_name = canSend)]
    pub fn can_send(&self) -> bool {
        self.controller.borrow().can_send()
    }

    #[wasm_bindgen(js_name = canChangeModel)]
    pub fn can_change_model(&self) -> bool {
        self.controller.borrow().can_change_model()
    }

    /// Full read-only projection of the session as JSON
    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        self.controller.borrow().snapshot().to_json().map_err(to_js)
    }

    /// Session events since the last drain, as a JSON array
    #[wasm_bindgen(js_name = drainEventsJson)]
    pub fn drain_events_json(&self) -> Result<String, JsValue> {
        let events = self.event_bus.drain();
        serde_json::to_string(&events).map_err(|e| to_js(e.into()))
    }
}

impl TranscriptSession {
    fn spawn_pump(&self, live: LiveConnection) {
        let controller = self.controller.clone();
        let notifier = self.notifier.clone();
        spawn_local(async move {
            pump(&controller, live, || notifier.notify()).await;
        });
    }
}

impl Drop for TranscriptSession {
    fn drop(&mut self) {
        if let Ok(mut controller) = self.controller.try_borrow_mut() {
            controller.close();
        }
    }
}
