//! Session manager messages
//!
//! Commands and responses for the session actor.

use std::fmt;

use thiserror::Error;
use tokio::sync::oneshot;

use super::state::SessionState;
use crate::client::{ClientError, PlanRequest};
use crate::domain::{ActionIndex, PlannedAction};
use crate::planning::ContextUsage;
use crate::queue::OutOfRange;

/// Session operations that talk to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Plan,
    Start,
    Next,
    Approve,
    Resume,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Plan => "plan",
            Operation::Start => "start",
            Operation::Next => "next",
            Operation::Approve => "approve",
            Operation::Resume => "resume",
        };
        write!(f, "{}", name)
    }
}

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No active session")]
    NoActiveSession,

    #[error("No action is awaiting a decision")]
    NoPendingAction,

    #[error("Another operation is in flight ({0})")]
    Busy(Operation),

    #[error("Channel error")]
    ChannelError,
}

/// Response from session operations
pub type SessionResponse<T> = Result<T, SessionError>;

/// Result of a successful plan or session transition
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Human-readable message for the caller
    pub message: String,
    pub state: SessionState,
    pub session_id: Option<String>,
    /// Local index of the action awaiting a decision
    pub current: Option<ActionIndex>,
    /// Queue length after the transition
    pub queued: usize,
    /// Descriptors dropped by validation
    pub dropped: usize,
}

/// Outcome of the previously executed action, relayed by `next`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorResult {
    pub ok: bool,
    pub message: String,
}

impl PriorResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Cloned view of the orchestration state for rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub session_id: Option<String>,
    pub current: Option<ActionIndex>,
    pub targets: Vec<String>,
    pub actions: Vec<PlannedAction>,
    pub usage: ContextUsage,
}

/// Commands sent to the SessionManager actor
#[derive(Debug)]
pub enum SessionCommand {
    // Server round trips
    Plan {
        request: PlanRequest,
        reply: oneshot::Sender<SessionResponse<StepOutcome>>,
    },
    Start {
        request: PlanRequest,
        reply: oneshot::Sender<SessionResponse<StepOutcome>>,
    },
    Next {
        prior: Option<PriorResult>,
        reply: oneshot::Sender<SessionResponse<StepOutcome>>,
    },
    Approve {
        approved: bool,
        reply: oneshot::Sender<SessionResponse<StepOutcome>>,
    },
    Resume {
        session_id: Option<String>,
        reply: oneshot::Sender<SessionResponse<StepOutcome>>,
    },

    // Queue operations
    Count {
        reply: oneshot::Sender<usize>,
    },
    GetAction {
        index: ActionIndex,
        reply: oneshot::Sender<SessionResponse<PlannedAction>>,
    },
    Preview {
        index: ActionIndex,
        reply: oneshot::Sender<SessionResponse<String>>,
    },
    SetApproved {
        index: ActionIndex,
        approved: bool,
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    PopApproved {
        reply: oneshot::Sender<Vec<PlannedAction>>,
    },
    ClearQueue {
        reply: oneshot::Sender<()>,
    },
    RecordOutcome {
        index: ActionIndex,
        succeeded: bool,
        attempt_count: u32,
        reply: oneshot::Sender<()>,
    },
    NextPending {
        reply: oneshot::Sender<Option<ActionIndex>>,
    },

    // Whole-state operations
    Reset {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },

    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Plan.to_string(), "plan");
        assert_eq!(Operation::Resume.to_string(), "resume");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SessionError::Busy(Operation::Approve).to_string(),
            "Another operation is in flight (approve)"
        );
        assert_eq!(
            SessionError::SessionNotFound("s9".to_string()).to_string(),
            "Session not found: s9"
        );

        let rejected: SessionError = ClientError::ServerRejected {
            message: "Prompt is empty".to_string(),
            code: None,
        }
        .into();
        assert_eq!(rejected.to_string(), "Prompt is empty");
    }
}
