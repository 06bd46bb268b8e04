use super::model::{SessionEvent, SessionState};
use crate::entity::EntityKind;
use thiserror::Error;

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Broken assumptions about the page or about call order. These stop the
/// current operation and are never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid session transition: from {from:?} using event {event:?}")]
    InvalidTransition {
        from: SessionState,
        event: SessionEvent,
    },
    #[error("{} row `{element_id}` has no usable id", .kind.label())]
    MissingIdentifier {
        kind: EntityKind,
        element_id: String,
    },
    #[error("{} row is missing its {part}", .kind.label())]
    MissingElement {
        kind: EntityKind,
        part: &'static str,
    },
    #[error("no category selected for the new link")]
    MissingTargetCategory,
    #[error("no edit is in progress")]
    NoActiveEdit,
}
