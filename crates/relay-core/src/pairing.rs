//! Tool call pairing.
//!
//! A `tool_result` references its `tool_use` by tool id only, and may arrive
//! before it, right after it, or many events later. Pairing is therefore
//! computed over the finished sequence of parts, never at append time.

use std::collections::HashMap;

use relay_types::transcript::{Part, ToolCallView, Turn};
use serde_json::Value;

/// Index of tool invocations and their results across a transcript
#[derive(Debug, Default, Clone)]
pub struct ToolPairing {
    calls: Vec<ToolCallView>,
    by_id: HashMap<String, usize>,
    /// Results whose invocation has not been seen
    orphans: HashMap<String, Value>,
}

impl ToolPairing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair every tool part of the given turns, plus optional trailing parts
    /// (the in-progress turn).
    pub fn from_turns(turns: &[Turn], in_progress: Option<&[Part]>) -> Self {
        let mut pairing = Self::new();
        for turn in turns {
            pairing.observe_all(&turn.parts);
        }
        if let Some(parts) = in_progress {
            pairing.observe_all(parts);
        }
        pairing
    }

    pub fn observe_all(&mut self, parts: &[Part]) {
        for part in parts {
            self.observe(part);
        }
    }

    pub fn observe(&mut self, part: &Part) {
        match part {
            Part::ToolUse {
                tool_id,
                tool_name,
                input,
            } => {
                if self.by_id.contains_key(tool_id) {
                    return;
                }
                self.by_id.insert(tool_id.clone(), self.calls.len());
                self.calls.push(ToolCallView {
                    tool_id: tool_id.clone(),
                    tool_name: tool_name.clone(),
                    input: input.clone(),
                    output: self.orphans.remove(tool_id),
                });
            }
            Part::ToolResult { tool_id, output } => match self.by_id.get(tool_id) {
                Some(&index) => {
                    let call = &mut self.calls[index];
                    if call.output.is_none() {
                        call.output = Some(output.clone());
                    }
                }
                None => {
                    self.orphans
                        .entry(tool_id.clone())
                        .or_insert_with(|| output.clone());
                }
            },
            Part::Text { .. } => {}
        }
    }

    /// Invocations in order of appearance, each joined with its result
    pub fn calls(&self) -> &[ToolCallView] {
        &self.calls
    }

    pub fn call(&self, tool_id: &str) -> Option<&ToolCallView> {
        self.by_id.get(tool_id).map(|&i| &self.calls[i])
    }

    pub fn result_for(&self, tool_id: &str) -> Option<&Value> {
        self.call(tool_id)
            .and_then(|call| call.output.as_ref())
            .or_else(|| self.orphans.get(tool_id))
    }

    /// Invocations still waiting for a result
    pub fn pending(&self) -> impl Iterator<Item = &ToolCallView> {
        self.calls.iter().filter(|call| call.output.is_none())
    }
}
