//! Session orchestration
//!
//! `SessionCore` holds the plan/session state machine; `SessionManager` is
//! the async handle that serialises access to it.

mod manager;
mod messages;
mod state;

pub use manager::SessionManager;
pub use messages::{Operation, PriorResult, SessionCommand, SessionError, SessionResponse, SessionSnapshot, StepOutcome};
pub use state::{PendingRequest, Session, SessionCore, SessionState};
