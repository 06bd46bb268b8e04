pub mod error;
pub mod machine;
pub mod model;

pub use error::{SessionError, SessionResult};
pub use machine::StateMachine;
pub use model::{
    DeleteSession, EditNodes, EditSession, Session, SessionEvent, SessionState, Snapshot,
    StateTransition,
};
