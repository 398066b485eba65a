//! Dedup registry: suppresses events that were already applied.
//!
//! Joining a running backend session (or reconnecting to one) replays
//! `user`, `tool_use` and `tool_result` records the view has already shown.
//! Each transcript event maps to a composite key; a key seen once is never
//! applied again for the lifetime of the logical session.

use std::collections::HashSet;

use relay_types::protocol::{timestamp_text, EventKind, ServerEvent};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// Keyed by backend message id. `discriminator` keeps apart the tool
    /// blocks of one message.
    Message {
        kind: EventKind,
        message_id: String,
        discriminator: String,
    },
    Tool {
        kind: EventKind,
        tool_id: String,
    },
    Content {
        kind: EventKind,
        timestamp: Option<String>,
        content: String,
    },
}

impl DedupKey {
    /// Key for an event, or `None` when the event kind is never gated.
    pub fn for_event(event: &ServerEvent) -> Option<DedupKey> {
        let kind = event.kind();
        match event {
            ServerEvent::User {
                content,
                message_id,
                timestamp,
            } => Some(match message_id {
                Some(id) => DedupKey::Message {
                    kind,
                    message_id: id.clone(),
                    discriminator: String::new(),
                },
                None => DedupKey::Content {
                    kind,
                    timestamp: timestamp.as_ref().and_then(timestamp_text),
                    content: content.clone(),
                },
            }),
            ServerEvent::ToolUse {
                tool_id,
                message_id,
                ..
            }
            | ServerEvent::ToolResult {
                tool_id,
                message_id,
                ..
            } => Some(match message_id {
                Some(id) => DedupKey::Message {
                    kind,
                    message_id: id.clone(),
                    discriminator: tool_id.clone(),
                },
                None => DedupKey::Tool {
                    kind,
                    tool_id: tool_id.clone(),
                },
            }),
            // Deltas carry no position, so a repeat may be legitimate text
            ServerEvent::Assistant { .. }
            | ServerEvent::Connected
            | ServerEvent::SessionStarted { .. }
            | ServerEvent::SessionJoined { .. }
            | ServerEvent::System { .. }
            | ServerEvent::Done
            | ServerEvent::Error { .. }
            | ServerEvent::Unknown => None,
        }
    }
}

/// Per-session set of applied event keys
#[derive(Debug, Default)]
pub struct DedupRegistry {
    seen: HashSet<DedupKey>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the event's key and return `true` if it was not seen before.
    /// A duplicate leaves the registry untouched and returns `false`.
    pub fn should_apply(&mut self, event: &ServerEvent) -> bool {
        match DedupKey::for_event(event) {
            Some(key) => {
                if self.seen.contains(&key) {
                    log::debug!("Dropping replayed {} event", event.kind().as_str());
                    false
                } else {
                    self.seen.insert(key);
                    true
                }
            }
            None => true,
        }
    }

    /// Mark an event as applied without gating it (history records).
    pub fn record(&mut self, event: &ServerEvent) {
        if let Some(key) = DedupKey::for_event(event) {
            self.seen.insert(key);
        }
    }

    pub fn contains(&self, event: &ServerEvent) -> bool {
        DedupKey::for_event(event).is_some_and(|key| self.seen.contains(&key))
    }

    /// Forget everything; called when the logical session is replaced.
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
