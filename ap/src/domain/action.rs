//! PlannedAction - one typed, stateful unit of automation work
//!
//! The command kind is fixed at construction. Only approval, outcome state and
//! attempt count change afterwards, and only through the owning queue.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::command::{ActionKind, KindError};
use super::params::{ParamError, Params};

/// Stable integer handle into the action queue
///
/// UI, executor and session all address actions by this index; none of them
/// hold references into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionIndex(pub usize);

impl ActionIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for ActionIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for ActionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned severity, informs the approval UI only
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parse a server risk string; absent or unknown values fall back to `Low`
    pub fn from_wire(value: Option<&str>) -> Self {
        value.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// Execution outcome of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why an action descriptor was dropped during parsing
///
/// Never surfaced to callers; the parser logs it and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    #[error("descriptor is not an object")]
    NotAnObject,

    #[error("descriptor has no command identifier")]
    MissingCommand,

    #[error("unrecognized command '{0}'")]
    UnknownCommand(String),

    #[error("invalid params for '{command}': {source}")]
    InvalidParams {
        command: String,
        #[source]
        source: ParamError,
    },

    #[error("params for '{0}' are not an object")]
    ParamsNotAnObject(String),
}

impl From<KindError> for DescriptorError {
    fn from(err: KindError) -> Self {
        match err {
            KindError::Unknown(command) => Self::UnknownCommand(command),
            KindError::Invalid { command, source } => Self::InvalidParams { command, source },
        }
    }
}

/// A parsed command plus its runtime bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAction {
    kind: ActionKind,
    risk: RiskLevel,
    approved: bool,
    state: ActionState,
    attempt_count: u32,
    server_index: Option<usize>,
}

impl PlannedAction {
    /// Create a pending, approved action
    pub fn new(kind: ActionKind, risk: RiskLevel) -> Self {
        Self {
            kind,
            risk,
            approved: true,
            state: ActionState::Pending,
            attempt_count: 0,
            server_index: None,
        }
    }

    /// Remember the index the server uses for this action
    pub fn with_server_index(mut self, server_index: Option<usize>) -> Self {
        self.server_index = server_index;
        self
    }

    /// Parse one `{command, params, risk}` descriptor
    pub fn from_descriptor(descriptor: &Value) -> Result<Self, DescriptorError> {
        let obj = descriptor.as_object().ok_or(DescriptorError::NotAnObject)?;
        let command = obj
            .get("command")
            .and_then(Value::as_str)
            .ok_or(DescriptorError::MissingCommand)?;
        debug!(%command, "from_descriptor: called");

        let empty = Map::new();
        let params = match obj.get("params") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Err(DescriptorError::ParamsNotAnObject(command.to_string())),
        };

        let kind = ActionKind::from_command(command, &Params::new(params))?;
        let risk = RiskLevel::from_wire(obj.get("risk").and_then(Value::as_str));
        Ok(Self::new(kind, risk))
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn command(&self) -> &'static str {
        self.kind.command_id()
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk
    }

    pub fn approved(&self) -> bool {
        self.approved
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn server_index(&self) -> Option<usize> {
        self.server_index
    }

    pub fn is_pending(&self) -> bool {
        self.state == ActionState::Pending
    }

    pub(crate) fn set_approved(&mut self, approved: bool) {
        self.approved = approved;
    }

    pub(crate) fn record_outcome(&mut self, succeeded: bool, attempt_count: u32) {
        self.state = if succeeded {
            ActionState::Succeeded
        } else {
            ActionState::Failed
        };
        self.attempt_count = attempt_count;
    }

    /// Deterministic one-line rendering for UI and logs
    pub fn preview(&self) -> String {
        let mut text = format!("{} [{}] {}", self.command(), self.risk, self.kind.describe());
        if !self.approved {
            text.push_str(" (rejected)");
        }
        if self.state != ActionState::Pending {
            text.push_str(&format!(" -> {} (attempts {})", self.state, self.attempt_count));
        }
        text
    }
}
