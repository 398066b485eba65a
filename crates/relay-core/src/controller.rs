//! Session controller — owns one duplex connection per transcript view.
//!
//! Frames flow: transport → decoder → dedup gate → assembler → event bus.
//! The controller also issues the outbound commands (connect, message,
//! interrupt), decides when a model change needs a fresh backend session,
//! and guards history paging.
//!
//! Every connection gets a generation number. Transport events carry the
//! generation they were produced for, and events from a superseded
//! connection are dropped.

use std::cell::RefCell;

use futures::StreamExt;
use relay_types::{
    config::ClientConfig,
    event::SessionEvent,
    history::{HistoryPage, HistoryRequest},
    protocol::{ClientCommand, ServerEvent},
    session::{ConnectionState, Session},
    transcript::{Part, Turn},
    ClientError, Result,
};

use crate::assembler::{Applied, TranscriptAssembler};
use crate::decoder::{decode_frame, Decoded};
use crate::dedup::DedupRegistry;
use crate::event_bus::EventBus;
use crate::pagination::{HistoryLoader, PaginationCursor};
use crate::pairing::ToolPairing;
use crate::ports::{
    CommandSink, Connection, ConnectionPort, HistoryPort, TransportEvent, TransportStream,
};
use crate::snapshot::{InProgressView, TranscriptSnapshot};
use crate::system_policy::SystemPolicy;

/// Inbound half of a connection opened by [`SessionController::connect`]
pub struct LiveConnection {
    pub generation: u64,
    pub events: TransportStream,
}

/// What the caller must do after a model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSwitch {
    /// Same model as before; nothing to do
    Unchanged,
    /// Reopen the connection so the next `connect` carries the new model.
    /// `fresh_session` is set when the backend session was dropped.
    Reconnect { fresh_session: bool },
}

pub struct SessionController {
    config: ClientConfig,
    session: Session,
    model: String,
    state: ConnectionState,
    streaming: bool,
    generation: u64,
    dedup: DedupRegistry,
    assembler: TranscriptAssembler,
    history: HistoryLoader,
    sink: Option<Box<dyn CommandSink>>,
    event_bus: EventBus,
}

impl SessionController {
    pub fn new(config: ClientConfig, event_bus: EventBus) -> Result<Self> {
        config.validate()?;
        let policy = SystemPolicy::from_config(&config.system_events)?;
        let session = match &config.resume_session_id {
            Some(id) => Session::resume(config.workspace.clone(), config.agent_type, id.clone()),
            None => Session::new(config.workspace.clone(), config.agent_type),
        };
        let model = config.effective_model().to_string();
        let history = HistoryLoader::new(config.history_page_size);

        Ok(Self {
            config,
            session,
            model,
            state: ConnectionState::Disconnected,
            streaming: false,
            generation: 0,
            dedup: DedupRegistry::new(),
            assembler: TranscriptAssembler::new(policy),
            history,
            sink: None,
            event_bus,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn turns(&self) -> &[Turn] {
        self.assembler.turns()
    }

    pub fn assembler(&self) -> &TranscriptAssembler {
        &self.assembler
    }

    pub fn dedup(&self) -> &DedupRegistry {
        &self.dedup
    }

    pub fn history_cursor(&self) -> PaginationCursor {
        self.history.cursor()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Whether the model control is enabled
    pub fn can_change_model(&self) -> bool {
        let locked = self.session.agent_type.locks_model_per_session()
            && self.session.agent_session_id.is_some();
        !self.streaming && !locked
    }

    pub fn can_send(&self) -> bool {
        self.state.accepts_input() && !self.streaming && self.sink.is_some()
    }

    pub fn can_load_history(&self) -> bool {
        self.history.can_load() && self.session.history_id().is_some()
    }

    /// The `connect` command for the current session and model
    pub fn connect_command(&self) -> ClientCommand {
        ClientCommand::Connect {
            agent_type: Some(self.session.agent_type),
            session_id: self.session.agent_session_id.clone(),
            model: Some(self.model.clone()),
            project_path: self.config.project_path.clone(),
        }
    }

    // ─── Connection lifecycle ────────────────────────────────

    /// Open a new connection. The caller pumps the returned events back
    /// through [`handle_transport`](Self::handle_transport).
    pub fn connect(&mut self, port: &dyn ConnectionPort) -> Result<LiveConnection> {
        if matches!(self.state, ConnectionState::Connecting | ConnectionState::Open) {
            return Err(ClientError::InvalidState(
                "a connection is already active".to_string(),
            ));
        }

        self.generation += 1;
        self.set_state(ConnectionState::Connecting);

        let url = self.config.ws_url();
        log::info!("Connecting to {} (generation {})", url, self.generation);
        match port.connect(&url, &self.config.workspace) {
            Ok(Connection { sink, events }) => {
                self.sink = Some(sink);
                Ok(LiveConnection {
                    generation: self.generation,
                    events,
                })
            }
            Err(e) => {
                self.lose_connection(ConnectionState::Errored, Some(format!("Connection failed: {}", e)));
                Err(e)
            }
        }
    }

    /// Close the current connection (if any) and open a fresh one.
    pub fn reconnect(&mut self, port: &dyn ConnectionPort) -> Result<LiveConnection> {
        self.close();
        self.connect(port)
    }

    /// Close the connection on the user's behalf. No system turn is shown.
    pub fn close(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        if self.assembler.interrupt() {
            log::debug!("Discarded partial response on close");
        }
        self.assembler.clear_echoes();
        self.set_streaming(false);
        if matches!(self.state, ConnectionState::Connecting | ConnectionState::Open) {
            self.set_state(ConnectionState::Closed);
        }
    }

    /// Apply one transport signal produced for connection `generation`.
    pub fn handle_transport(&mut self, generation: u64, event: TransportEvent) {
        if generation != self.generation {
            log::debug!(
                "Ignoring transport event from stale connection {} (current {})",
                generation,
                self.generation
            );
            return;
        }
        if self.state.is_terminal() {
            log::debug!("Ignoring transport event after the connection ended");
            return;
        }

        match event {
            TransportEvent::Opened => self.on_open(),
            TransportEvent::Frame(raw) => self.handle_frame(&raw),
            TransportEvent::Closed { clean, code, reason } => {
                let (state, verb) = if clean {
                    log::info!("Connection closed (code {}): {}", code, reason);
                    (ConnectionState::Closed, "closed")
                } else {
                    log::warn!("Connection lost (code {}): {}", code, reason);
                    (ConnectionState::Errored, "lost")
                };
                let message = if reason.is_empty() {
                    format!("Connection {} (code {})", verb, code)
                } else {
                    format!("Connection {}: {} (code {})", verb, reason, code)
                };
                self.lose_connection(state, Some(message));
            }
            TransportEvent::Error(message) => {
                log::warn!("Connection error: {}", message);
                self.lose_connection(
                    ConnectionState::Errored,
                    Some(format!("Connection error: {}", message)),
                );
            }
        }
    }

    fn on_open(&mut self) {
        self.set_state(ConnectionState::Open);
        let command = self.connect_command();
        let sent = match &self.sink {
            Some(sink) => sink.send(&command),
            None => Err(ClientError::InvalidState("no open connection".to_string())),
        };
        if let Err(e) = sent {
            log::warn!("Failed to send connect command: {}", e);
            self.lose_connection(ConnectionState::Errored, Some(format!("Connection error: {}", e)));
        }
    }

    /// Tear down after the transport ended. Partial assistant output is not
    /// durable and is dropped.
    fn lose_connection(&mut self, state: ConnectionState, notice: Option<String>) {
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        if self.assembler.interrupt() {
            log::debug!("Discarded partial response after disconnect");
        }
        self.assembler.clear_echoes();
        self.set_streaming(false);
        self.set_state(state);
        if let Some(text) = notice {
            let turn = self.assembler.push_system(text);
            self.event_bus.emit(SessionEvent::TurnCommitted { turn });
        }
    }

    // ─── Inbound events ──────────────────────────────────────

    /// Decode and apply one raw frame. Undecodable frames are dropped.
    pub fn handle_frame(&mut self, raw: &str) {
        match decode_frame(raw) {
            Decoded::Event(event) => self.handle_event(event),
            Decoded::Ignored(reason) => log::debug!("Ignored frame: {:?}", reason),
        }
    }

    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected => log::info!("Backend acknowledged the connection"),
            ServerEvent::SessionStarted {
                session_id,
                agent_session_id,
                status,
            }
            | ServerEvent::SessionJoined {
                session_id,
                agent_session_id,
                status,
            } => self.identify(session_id, agent_session_id, status),
            ServerEvent::Unknown => {}
            event @ (ServerEvent::System { .. }
            | ServerEvent::User { .. }
            | ServerEvent::ToolUse { .. }
            | ServerEvent::ToolResult { .. }
            | ServerEvent::Assistant { .. }
            | ServerEvent::Done
            | ServerEvent::Error { .. }) => self.apply_transcript_event(event),
        }
    }

    fn identify(
        &mut self,
        session_id: String,
        agent_session_id: Option<String>,
        status: Option<String>,
    ) {
        let replaced = self
            .session
            .local_id
            .as_deref()
            .is_some_and(|known| known != session_id);
        if replaced {
            log::info!("Logical session replaced by {}", session_id);
            self.dedup.clear();
            self.assembler.clear_echoes();
            self.history.exhaust();
        }

        self.session.local_id = Some(session_id.clone());
        if agent_session_id.is_some() {
            self.session.agent_session_id = agent_session_id;
        }
        if status.is_some() {
            self.session.status = status;
        }
        self.event_bus.emit(SessionEvent::SessionIdentified {
            session_id,
            agent_session_id: self.session.agent_session_id.clone(),
        });
    }

    fn apply_transcript_event(&mut self, event: ServerEvent) {
        if !self.dedup.should_apply(&event) {
            return;
        }
        let ends_response = matches!(event, ServerEvent::Done | ServerEvent::Error { .. });

        match self.assembler.apply(event) {
            Applied::Unchanged | Applied::EchoConsumed | Applied::Suppressed => {}
            Applied::Streaming => {
                self.set_streaming(true);
                if let Some(builder) = self.assembler.in_progress() {
                    self.event_bus.emit(SessionEvent::StreamUpdated {
                        text: builder.preview_text(),
                    });
                }
            }
            Applied::Committed(turn) => {
                self.event_bus.emit(SessionEvent::TurnCommitted { turn });
            }
            Applied::Continuation(id) => self.adopt_agent_session(id),
        }

        if ends_response {
            self.set_streaming(false);
        }
    }

    fn adopt_agent_session(&mut self, id: String) {
        if self.session.agent_session_id.as_deref() == Some(id.as_str()) {
            return;
        }
        log::info!("Backend agent session is {}", id);
        self.session.agent_session_id = Some(id);
        self.event_bus.emit(SessionEvent::SessionIdentified {
            session_id: self.session.local_id.clone().unwrap_or_default(),
            agent_session_id: self.session.agent_session_id.clone(),
        });
    }

    // ─── Outbound commands ───────────────────────────────────

    /// Send a user message. The message appears in the transcript right
    /// away; its backend echo is absorbed when it arrives.
    pub fn submit(&mut self, text: &str) -> Result<()> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ClientError::InvalidState("message is empty".to_string()));
        }
        if !self.state.accepts_input() {
            return Err(ClientError::InvalidState(format!(
                "cannot send while {}",
                self.state.label().to_lowercase()
            )));
        }
        if self.streaming {
            return Err(ClientError::InvalidState(
                "the agent is still responding".to_string(),
            ));
        }
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| ClientError::InvalidState("no open connection".to_string()))?;

        sink.send(&ClientCommand::Message {
            content: content.to_string(),
        })?;

        let turn = self.assembler.push_local_user(content);
        self.event_bus.emit(SessionEvent::TurnCommitted { turn });
        self.set_streaming(true);
        Ok(())
    }

    /// Stop the current response. Fire-and-forget: the partial response is
    /// dropped locally without waiting for the backend.
    pub fn interrupt(&mut self) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.send(&ClientCommand::Interrupt) {
                log::warn!("Failed to send interrupt: {}", e);
            }
        }
        if self.assembler.interrupt() {
            log::info!("Interrupted; partial response discarded");
        }
        self.set_streaming(false);
    }

    /// Select a model for subsequent agent turns.
    pub fn select_model(&mut self, model: &str) -> Result<ModelSwitch> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ClientError::Config("model must not be empty".to_string()));
        }
        if model == self.model {
            return Ok(ModelSwitch::Unchanged);
        }
        if self.streaming {
            return Err(ClientError::InvalidState(
                "cannot switch model while the agent is responding".to_string(),
            ));
        }

        if self.session.agent_session_id.is_none() {
            log::info!("Model set to {}", model);
            self.model = model.to_string();
            self.event_bus.emit(SessionEvent::ModelChanged {
                model: self.model.clone(),
                fresh_session: false,
            });
            return Ok(ModelSwitch::Reconnect {
                fresh_session: false,
            });
        }

        let agent = self.session.agent_type;
        if agent.locks_model_per_session() {
            return Err(ClientError::ModelLocked {
                agent: agent.label().to_string(),
            });
        }

        log::info!("Model switched to {}; starting a new backend session", model);
        self.model = model.to_string();
        self.session.agent_session_id = None;
        self.session.local_id = None;
        self.session.status = None;
        self.dedup.clear();
        self.assembler.clear_echoes();
        self.history.exhaust();

        let turn = self.assembler.push_system(format!(
            "Switched model to {}. Your next message starts a new session.",
            model
        ));
        self.event_bus.emit(SessionEvent::TurnCommitted { turn });
        self.event_bus.emit(SessionEvent::ModelChanged {
            model: self.model.clone(),
            fresh_session: true,
        });
        Ok(ModelSwitch::Reconnect {
            fresh_session: true,
        })
    }

    // ─── History ─────────────────────────────────────────────

    /// Claim the history slot. `Ok(None)` means nothing older remains.
    pub fn begin_history(&mut self) -> Result<Option<HistoryRequest>> {
        self.history.begin(&self.session)
    }

    /// Finish a history request started by [`begin_history`](Self::begin_history).
    /// Returns the number of turns added before the transcript head.
    ///
    /// Records already applied live are skipped, and every merged record is
    /// registered so a later replay of it is suppressed.
    pub fn complete_history(&mut self, result: Result<HistoryPage>) -> usize {
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.history.fail(&e);
                return 0;
            }
        };
        if !self.history.is_loading() {
            log::debug!("Dropping history page for an abandoned request");
            return 0;
        }

        let existing = self.assembler.take_turns();
        let dedup = &mut self.dedup;
        let merged = self
            .history
            .complete(existing, &page, |event| dedup.should_apply(event));
        self.assembler.restore_turns(merged.turns);

        log::debug!(
            "Merged {} history turns (offset {}, more: {})",
            merged.added,
            merged.offset,
            merged.has_more
        );
        self.event_bus.emit(SessionEvent::HistoryMerged {
            added: merged.added,
            has_more: merged.has_more,
        });
        merged.added
    }

    // ─── Snapshot ────────────────────────────────────────────

    pub fn snapshot(&self) -> TranscriptSnapshot {
        let in_progress = self.assembler.in_progress().map(|builder| InProgressView {
            parts: builder
                .parts()
                .iter()
                .filter(|part| !part.is_placeholder())
                .cloned()
                .collect::<Vec<Part>>(),
            text: builder.preview_text(),
        });
        let pairing = ToolPairing::from_turns(
            self.assembler.turns(),
            self.assembler.in_progress().map(|b| b.parts()),
        );

        TranscriptSnapshot {
            session: self.session.clone(),
            connection: self.state,
            streaming: self.streaming,
            model: self.model.clone(),
            can_change_model: self.can_change_model(),
            can_send: self.can_send(),
            can_load_history: self.can_load_history(),
            turns: self.assembler.turns().to_vec(),
            in_progress,
            tool_calls: pairing.calls().to_vec(),
            history: self.history.cursor(),
            loading_history: self.history.is_loading(),
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            log::info!("Connection {} -> {}", self.state.label(), state.label());
            self.state = state;
            self.event_bus.emit(SessionEvent::ConnectionChanged { state });
        }
    }

    fn set_streaming(&mut self, streaming: bool) {
        if self.streaming != streaming {
            self.streaming = streaming;
            self.event_bus
                .emit(SessionEvent::StreamingChanged { streaming });
        }
    }
}

/// Drive a live connection until its stream ends, calling `on_applied`
/// after every transport event.
///
/// The controller is borrowed once per transport event and never across an
/// await, so history loads and user commands interleave freely.
pub async fn pump(
    controller: &RefCell<SessionController>,
    connection: LiveConnection,
    mut on_applied: impl FnMut(),
) {
    let LiveConnection {
        generation,
        mut events,
    } = connection;

    while let Some(event) = events.next().await {
        controller.borrow_mut().handle_transport(generation, event);
        on_applied();
    }

    // A stream that ends without a close frame still ends the connection
    controller.borrow_mut().handle_transport(
        generation,
        TransportEvent::Closed {
            clean: true,
            code: 1000,
            reason: String::new(),
        },
    );
    on_applied();
}

/// Fetch and merge the next page of older history.
/// Returns the number of turns added; `Ok(0)` when history is exhausted.
pub async fn load_older(
    controller: &RefCell<SessionController>,
    port: &dyn HistoryPort,
) -> Result<usize> {
    let request = controller.borrow_mut().begin_history()?;
    let Some(request) = request else {
        return Ok(0);
    };

    let result = port.fetch_page(&request).await;
    let failure = result.as_ref().err().cloned();
    let added = controller.borrow_mut().complete_history(result);
    match failure {
        Some(e) => Err(e),
        None => Ok(added),
    }
}
