//! Per-request state machine
//!
//! `Idle -> AwaitingCredential -> GatheringContext -> Composing -> Generating
//! -> {Succeeded | Failed} -> Done`. Any non-terminal phase may fail. No phase
//! is entered twice.

use std::fmt::Debug;

use crate::error::{Error, Result};

/// Phases a single review request moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPhase {
    Idle,
    AwaitingCredential,
    GatheringContext,
    Composing,
    Generating,
    Succeeded,
    Failed,
    Done,
}

impl RequestPhase {
    /// Whether this phase is one of the two outcomes
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestPhase::Succeeded | RequestPhase::Failed)
    }

    /// State machine preloaded with the request lifecycle
    pub fn machine() -> StateMachine<RequestPhase> {
        use RequestPhase::*;

        let mut transitions = vec![
            (Idle, AwaitingCredential),
            (AwaitingCredential, GatheringContext),
            (GatheringContext, Composing),
            (Composing, Generating),
            (Generating, Succeeded),
            (Succeeded, Done),
            (Failed, Done),
        ];
        for phase in [Idle, AwaitingCredential, GatheringContext, Composing, Generating] {
            transitions.push((phase, Failed));
        }

        StateMachine::new(Idle).add_transitions(transitions)
    }
}

/// A table-driven state machine
#[derive(Debug, Clone)]
pub struct StateMachine<P: Clone + PartialEq + Debug> {
    current_phase: P,
    valid_transitions: Vec<(P, P)>,
}

impl<P: Clone + PartialEq + Debug> StateMachine<P> {
    /// Create a new state machine with the given initial phase
    pub fn new(initial_phase: P) -> Self {
        Self {
            current_phase: initial_phase,
            valid_transitions: Vec::new(),
        }
    }

    /// Add multiple valid transitions
    pub fn add_transitions(mut self, transitions: Vec<(P, P)>) -> Self {
        self.valid_transitions.extend(transitions);
        self
    }

    /// Get the current phase
    pub fn current_phase(&self) -> &P {
        &self.current_phase
    }

    /// Check if a transition to the given phase is valid
    pub fn can_transition_to(&self, phase: &P) -> bool {
        self.valid_transitions
            .iter()
            .any(|(f, t)| f == &self.current_phase && t == phase)
    }

    /// Attempt to transition to a new phase
    pub fn transition_to(&mut self, phase: P) -> Result<()> {
        if !self.can_transition_to(&phase) {
            return Err(Error::Other(format!(
                "Invalid transition from {:?} to {:?}",
                self.current_phase, phase
            )));
        }

        tracing::debug!(
            from = ?self.current_phase,
            to = ?phase,
            "Request phase transition"
        );

        self.current_phase = phase;
        Ok(())
    }
}
