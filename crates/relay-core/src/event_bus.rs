//! Simple event bus for decoupled communication between the session
//! controller and the view.
//!
//! The bus is single-threaded (WASM constraint) and uses interior mutability
//! via RefCell. Events are buffered and drained by the view when it renders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use relay_types::event::SessionEvent;

/// Shared event bus, cheap to clone via Rc.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<SessionEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Publish an event. Called by the controller.
    ///
    /// Consecutive stream previews coalesce: only the newest preview of an
    /// undrained run is kept, so a fast stream cannot flood the queue.
    pub fn emit(&self, event: SessionEvent) {
        let mut queue = self.inner.borrow_mut();
        if let SessionEvent::StreamUpdated { .. } = event {
            if let Some(SessionEvent::StreamUpdated { .. }) = queue.back() {
                queue.pop_back();
            }
        }
        queue.push_back(event);
    }

    /// Drain all pending events. Called by the view.
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
