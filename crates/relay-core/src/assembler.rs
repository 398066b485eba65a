//! Transcript assembler — the streaming state machine.
//!
//! Consumes decoded, de-duplicated events in arrival order and maintains an
//! ordered list of completed turns plus at most one in-progress assistant
//! turn. Completed turns are never mutated after they are appended.
//!
//! In-progress states:
//! - `Absent`: no assistant output since the last flush
//! - `AccumulatingText`: text deltas land in the last text part
//! - `AwaitingTool`: a tool part was just appended, followed by an empty
//!   text placeholder for the next delta

use std::collections::VecDeque;

use relay_types::{
    protocol::ServerEvent,
    transcript::{flatten_text, parse_timestamp, Part, Turn},
};

use crate::system_policy::{SystemDisposition, SystemPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Absent,
    AccumulatingText,
    AwaitingTool,
}

/// Owned buffer for the in-progress assistant turn.
///
/// Every transition consumes the builder and returns its successor.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnBuilder {
    parts: Vec<Part>,
    message_id: Option<String>,
}

impl Default for TurnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnBuilder {
    /// Start with a single empty text part.
    pub fn new() -> Self {
        Self {
            parts: vec![Part::text("")],
            message_id: None,
        }
    }

    pub fn with_message_id(mut self, message_id: Option<&str>) -> Self {
        if self.message_id.is_none() {
            self.message_id = message_id.map(str::to_string);
        }
        self
    }

    pub fn push_text(mut self, delta: &str) -> Self {
        match self.parts.last_mut() {
            Some(Part::Text { text }) => text.push_str(delta),
            _ => self.parts.push(Part::text(delta)),
        }
        self
    }

    /// Append a tool part, replacing a trailing placeholder and leaving a
    /// fresh one after it.
    pub fn push_tool(mut self, part: Part) -> Self {
        if self.parts.last().is_some_and(Part::is_placeholder) {
            self.parts.pop();
        }
        self.parts.push(part);
        self.parts.push(Part::text(""));
        self
    }

    pub fn state(&self) -> StreamState {
        match self.parts.as_slice() {
            [.., tool, last]
                if last.is_placeholder() && tool.tool_id().is_some() =>
            {
                StreamState::AwaitingTool
            }
            _ => StreamState::AccumulatingText,
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn preview_text(&self) -> String {
        flatten_text(&self.parts)
    }

    /// Close the turn. Empty placeholders are dropped; nothing left means
    /// there is no turn to emit.
    pub fn finish(self) -> Option<Turn> {
        let mut parts = self.parts;
        parts.retain(|part| !part.is_placeholder());
        if parts.is_empty() {
            return None;
        }
        let turn = Turn::assistant(parts);
        Some(match self.message_id {
            Some(id) => turn.with_id(id),
            None => turn,
        })
    }
}

/// What applying one event changed
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Unchanged,
    /// The in-progress turn changed
    Streaming,
    /// A completed turn was appended
    Committed(Turn),
    /// A user event was recognised as the echo of a locally sent message
    EchoConsumed,
    /// A system event named the backend agent session
    Continuation(String),
    /// A system event was status noise
    Suppressed,
}

pub struct TranscriptAssembler {
    turns: Vec<Turn>,
    builder: Option<TurnBuilder>,
    /// Locally submitted messages whose backend echo has not arrived yet
    pending_echoes: VecDeque<String>,
    policy: SystemPolicy,
}

impl Default for TranscriptAssembler {
    fn default() -> Self {
        Self::new(SystemPolicy::default())
    }
}

impl TranscriptAssembler {
    pub fn new(policy: SystemPolicy) -> Self {
        Self {
            turns: Vec::new(),
            builder: None,
            pending_echoes: VecDeque::new(),
            policy,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn in_progress(&self) -> Option<&TurnBuilder> {
        self.builder.as_ref()
    }

    pub fn state(&self) -> StreamState {
        self.builder
            .as_ref()
            .map_or(StreamState::Absent, TurnBuilder::state)
    }

    /// Apply one decoded transcript event.
    pub fn apply(&mut self, event: ServerEvent) -> Applied {
        match event {
            ServerEvent::User {
                content,
                message_id,
                timestamp,
            } => {
                if let Some(pos) = self.pending_echoes.iter().position(|p| *p == content) {
                    self.pending_echoes.remove(pos);
                    return Applied::EchoConsumed;
                }
                let mut turn = Turn::user(content);
                if let Some(id) = message_id {
                    turn = turn.with_id(id);
                }
                if let Some(created_at) = timestamp.as_ref().and_then(parse_timestamp) {
                    turn = turn.with_created_at(created_at);
                }
                self.commit(turn)
            }
            ServerEvent::Assistant {
                content,
                message_id,
            } => {
                let builder = self
                    .builder
                    .take()
                    .unwrap_or_default()
                    .with_message_id(message_id.as_deref())
                    .push_text(&content);
                self.builder = Some(builder);
                Applied::Streaming
            }
            ServerEvent::ToolUse {
                tool_id,
                tool_name,
                content,
                message_id,
            } => self.push_tool(
                Part::ToolUse {
                    tool_id,
                    tool_name,
                    input: content,
                },
                message_id,
            ),
            ServerEvent::ToolResult {
                tool_id,
                content,
                message_id,
            } => self.push_tool(
                Part::ToolResult {
                    tool_id,
                    output: content,
                },
                message_id,
            ),
            // The response is over; an echo that has not arrived by now never will
            ServerEvent::Done => {
                self.pending_echoes.clear();
                match self.flush() {
                    Some(turn) => Applied::Committed(turn),
                    None => Applied::Unchanged,
                }
            }
            ServerEvent::Error { .. } => {
                self.pending_echoes.clear();
                let text = event.error_text().unwrap_or_default().to_string();
                Applied::Committed(self.fail(&text))
            }
            ServerEvent::System { content } => match self.policy.classify(&content) {
                SystemDisposition::Continuation(id) => Applied::Continuation(id),
                SystemDisposition::Suppress => Applied::Suppressed,
                SystemDisposition::Show(text) => self.commit(Turn::system(text)),
            },
            ServerEvent::Connected
            | ServerEvent::SessionStarted { .. }
            | ServerEvent::SessionJoined { .. }
            | ServerEvent::Unknown => Applied::Unchanged,
        }
    }

    fn push_tool(&mut self, part: Part, message_id: Option<String>) -> Applied {
        let builder = self
            .builder
            .take()
            .unwrap_or_default()
            .with_message_id(message_id.as_deref())
            .push_tool(part);
        self.builder = Some(builder);
        Applied::Streaming
    }

    fn commit(&mut self, turn: Turn) -> Applied {
        self.turns.push(turn.clone());
        Applied::Committed(turn)
    }

    /// Flush the in-progress turn into the completed sequence.
    pub fn flush(&mut self) -> Option<Turn> {
        let turn = self.builder.take()?.finish()?;
        self.turns.push(turn.clone());
        Some(turn)
    }

    /// Drop the in-progress turn and record a system turn for the failure.
    pub fn fail(&mut self, message: &str) -> Turn {
        self.builder = None;
        let turn = Turn::system(format!("Error: {}", message));
        self.turns.push(turn.clone());
        turn
    }

    /// Discard the in-progress turn without emitting anything.
    /// Returns whether partial content was dropped.
    pub fn interrupt(&mut self) -> bool {
        self.builder.take().is_some()
    }

    /// Append a message the user just submitted and expect its echo.
    pub fn push_local_user(&mut self, text: &str) -> Turn {
        self.pending_echoes.push_back(text.to_string());
        let turn = Turn::user(text);
        self.turns.push(turn.clone());
        turn
    }

    pub fn push_system(&mut self, text: impl Into<String>) -> Turn {
        let turn = Turn::system(text);
        self.turns.push(turn.clone());
        turn
    }

    /// Detach the completed turns, e.g. to merge history before them.
    pub fn take_turns(&mut self) -> Vec<Turn> {
        std::mem::take(&mut self.turns)
    }

    pub fn restore_turns(&mut self, turns: Vec<Turn>) {
        self.turns = turns;
    }

    /// Forget echo expectations, e.g. when the connection or session ends.
    pub fn clear_echoes(&mut self) {
        self.pending_echoes.clear();
    }
}

/// Group a finished run of history events into turns.
///
/// Uses the same text/tool rules as the live stream, run once: an open
/// assistant turn is flushed before each user record and at the end.
pub fn assemble_history(events: impl IntoIterator<Item = ServerEvent>) -> Vec<Turn> {
    let mut assembler = TranscriptAssembler::default();
    for event in events {
        match event {
            ServerEvent::User { .. } => {
                assembler.flush();
                assembler.apply(event);
            }
            ServerEvent::Assistant { .. }
            | ServerEvent::ToolUse { .. }
            | ServerEvent::ToolResult { .. }
            | ServerEvent::Done => {
                assembler.apply(event);
            }
            ServerEvent::Connected
            | ServerEvent::SessionStarted { .. }
            | ServerEvent::SessionJoined { .. }
            | ServerEvent::System { .. }
            | ServerEvent::Error { .. }
            | ServerEvent::Unknown => {}
        }
    }
    assembler.flush();
    assembler.take_turns()
}
