//! Splices pages of older history before the live transcript.

use relay_types::{
    history::{HistoryPage, HistoryRequest},
    protocol::ServerEvent,
    session::Session,
    transcript::Turn,
    ClientError, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assembler::assemble_history;
use crate::decoder::{decode_value, Decoded};

/// Paging state toward older history. The offset only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationCursor {
    pub offset: usize,
    pub page_size: usize,
    pub has_more: bool,
}

impl PaginationCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size,
            has_more: true,
        }
    }

    pub fn advance(&mut self, consumed: usize, has_more: bool) {
        self.offset += consumed;
        // A page that consumed nothing cannot make progress
        self.has_more = has_more && consumed > 0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub turns: Vec<Turn>,
    pub offset: usize,
    pub has_more: bool,
    /// Turns added before the previous head
    pub added: usize,
}

/// Decode raw history records into turns, skipping undecodable ones.
fn decode_records(records: &[Value], mut keep: impl FnMut(&ServerEvent) -> bool) -> Vec<Turn> {
    let events = records
        .iter()
        .cloned()
        .map(decode_value)
        .filter_map(Decoded::into_event)
        .filter(|event| keep(event));
    assemble_history(events)
}

/// Prepend one fetched page of older records to `existing`.
///
/// Performs no dedup across requests: callers must invoke it with strictly
/// increasing offsets from a single session's history.
pub fn merge_older_page(
    existing: Vec<Turn>,
    page: &HistoryPage,
    current_offset: usize,
) -> MergeResult {
    merge_older_page_filtered(existing, page, current_offset, |_| true)
}

/// Like [`merge_older_page`], but records rejected by `keep` are skipped.
/// Skipped records still count toward the offset.
pub fn merge_older_page_filtered(
    existing: Vec<Turn>,
    page: &HistoryPage,
    current_offset: usize,
    keep: impl FnMut(&ServerEvent) -> bool,
) -> MergeResult {
    let mut turns = decode_records(&page.messages, keep);
    let added = turns.len();
    turns.extend(existing);
    let consumed = page.messages.len();
    MergeResult {
        turns,
        offset: current_offset + consumed,
        has_more: page.has_more && consumed > 0,
        added,
    }
}

/// Owns the cursor and the single in-flight guard for history requests.
#[derive(Debug, Clone)]
pub struct HistoryLoader {
    cursor: PaginationCursor,
    in_flight: bool,
}

impl HistoryLoader {
    pub fn new(page_size: usize) -> Self {
        Self {
            cursor: PaginationCursor::new(page_size),
            in_flight: false,
        }
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.cursor
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn can_load(&self) -> bool {
        !self.in_flight && self.cursor.has_more
    }

    /// Claim the in-flight slot and build the next request.
    /// `Ok(None)` means history is exhausted.
    pub fn begin(&mut self, session: &Session) -> Result<Option<HistoryRequest>> {
        if self.in_flight {
            return Err(ClientError::PaginationInFlight);
        }
        if !self.cursor.has_more {
            return Ok(None);
        }
        let session_id = session.history_id().ok_or_else(|| {
            ClientError::InvalidState("session has no id to page history for".to_string())
        })?;
        self.in_flight = true;
        Ok(Some(HistoryRequest {
            workspace: session.workspace.clone(),
            session_id: session_id.to_string(),
            agent_type: session.agent_type,
            limit: self.cursor.page_size,
            offset: self.cursor.offset,
        }))
    }

    /// Merge a fetched page and release the slot. A page for an abandoned
    /// request leaves `existing` untouched.
    ///
    /// `keep` sees every decoded record and may reject those the view
    /// already shows.
    pub fn complete(
        &mut self,
        existing: Vec<Turn>,
        page: &HistoryPage,
        keep: impl FnMut(&ServerEvent) -> bool,
    ) -> MergeResult {
        if !self.in_flight {
            log::debug!("Discarding history page for an abandoned request");
            return MergeResult {
                turns: existing,
                offset: self.cursor.offset,
                has_more: self.cursor.has_more,
                added: 0,
            };
        }
        self.in_flight = false;
        let result = merge_older_page_filtered(existing, page, self.cursor.offset, keep);
        self.cursor.advance(page.messages.len(), page.has_more);
        result
    }

    /// Release the slot after a failed fetch; the same page can be retried.
    pub fn fail(&mut self, error: &ClientError) {
        log::warn!("History fetch failed: {}", error);
        self.in_flight = false;
    }

    /// Stop paging: the logical session was replaced and its history no
    /// longer precedes the transcript on screen. Abandons any request.
    pub fn exhaust(&mut self) {
        self.cursor.has_more = false;
        self.in_flight = false;
    }
}
