//! Listener contract and the emitter that enforces it
//!
//! Every request ends with exactly one terminal signal (`emit_response` or
//! `emit_error`) followed by exactly one `done`. [`ResponseEmitter`] makes
//! that structural: its terminal methods consume it, and dropping it without
//! a terminal call reports an error instead of going silent.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::review::response::ChatResponse;
use crate::review::state::{RequestPhase, StateMachine};
use crate::Error;

/// Reported when a request is abandoned without reaching an outcome
pub const ABANDONED_MESSAGE: &str = "Review request ended unexpectedly";

/// Callbacks supplied by the host for one request
pub trait ChatResponseListener: Send + Sync {
    /// A response envelope (interim status or final answer)
    fn emit_response(&self, response: ChatResponse);

    /// A terminal error message
    fn emit_error(&self, message: String);

    /// No further callbacks will follow
    fn done(&self);
}

/// Drives a listener through one request's lifecycle
pub struct ResponseEmitter {
    listener: Option<Arc<dyn ChatResponseListener>>,
    machine: StateMachine<RequestPhase>,
    status_sent: bool,
}

impl ResponseEmitter {
    /// Start a request in the `Idle` phase
    pub fn new(listener: Arc<dyn ChatResponseListener>) -> Self {
        Self {
            listener: Some(listener),
            machine: RequestPhase::machine(),
            status_sent: false,
        }
    }

    /// Current phase
    pub fn phase(&self) -> RequestPhase {
        *self.machine.current_phase()
    }

    /// Move to the next working phase
    pub fn enter(&mut self, phase: RequestPhase) -> crate::Result<()> {
        self.machine.transition_to(phase)
    }

    /// Send the interim status response; later calls are ignored
    ///
    /// Returns whether the status was sent.
    pub fn status(&mut self, text: &str) -> bool {
        if self.status_sent {
            return false;
        }
        if let Some(listener) = &self.listener {
            listener.emit_response(ChatResponse::text(text));
            self.status_sent = true;
        }
        self.status_sent
    }

    /// Deliver the final answer and complete the request
    pub fn succeed(mut self, text: impl Into<String>) {
        self.finish(RequestPhase::Succeeded);
        if let Some(listener) = self.listener.take() {
            listener.emit_response(ChatResponse::text(text));
            listener.done();
        }
    }

    /// Report `error` and complete the request
    pub fn fail(mut self, error: &Error) {
        self.finish(RequestPhase::Failed);
        if let Some(listener) = self.listener.take() {
            listener.emit_error(error.listener_message());
            listener.done();
        }
    }

    fn finish(&mut self, outcome: RequestPhase) {
        let from = self.phase();
        if let Err(e) = self
            .machine
            .transition_to(outcome)
            .and_then(|_| self.machine.transition_to(RequestPhase::Done))
        {
            warn!(from = ?from, outcome = ?outcome, error = %e, "Unexpected request outcome");
        }
        debug!(outcome = ?outcome, "Request complete");
    }
}

impl Drop for ResponseEmitter {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            warn!(phase = ?self.phase(), "Request dropped before reaching an outcome");
            listener.emit_error(ABANDONED_MESSAGE.to_string());
            listener.done();
        }
    }
}

/// One recorded listener callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Response(ChatResponse),
    Error(String),
    Done,
}

/// Listener that keeps every callback in order
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the callbacks so far
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Texts of all responses, in order
    pub fn responses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ListenerEvent::Response(r) => Some(r.full_text()),
                _ => None,
            })
            .collect()
    }

    /// All error messages, in order
    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ListenerEvent::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// Number of `done` callbacks
    pub fn done_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ListenerEvent::Done))
            .count()
    }

    fn push(&self, event: ListenerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ChatResponseListener for RecordingListener {
    fn emit_response(&self, response: ChatResponse) {
        self.push(ListenerEvent::Response(response));
    }

    fn emit_error(&self, message: String) {
        self.push(ListenerEvent::Error(message));
    }

    fn done(&self) {
        self.push(ListenerEvent::Done);
    }
}
