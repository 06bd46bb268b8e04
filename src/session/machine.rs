use super::error::{SessionError, SessionResult};
use super::model::{SessionEvent, SessionState, StateTransition};

/// Transition table for the edit session plus the record of transitions
/// taken so far.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: SessionState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        match (self.state, event) {
            // a new session always wins over whatever was live
            (_, StartEdit(kind)) => Some(SessionState::editing(kind)),
            (_, StartDelete(kind)) => Some(SessionState::confirming_delete(kind)),
            (from, Confirm | Cancel) if from.edit_kind().is_some() => Some(SessionState::Idle),
            (from, ConfirmDelete(kind)) if from.delete_kind() == Some(kind) => {
                Some(SessionState::Idle)
            }
            (from, CancelDelete) if from.delete_kind().is_some() => Some(SessionState::Idle),
            _ => None,
        }
    }

    /// Fails without side effects when `event` is not valid from here.
    pub fn check(&self, event: SessionEvent) -> SessionResult<SessionState> {
        self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid session transition requested");
            SessionError::InvalidTransition { from, event }
        })
    }

    pub fn transition(&mut self, event: SessionEvent) -> SessionResult<SessionState> {
        tracing::debug!(from = ?self.state, event = ?event, "session transition");
        let next = self.check(event)?;

        let record = StateTransition::new(self.state, event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state)
    }
}
