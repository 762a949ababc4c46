//! agentplan - editor-side client for agent plan and session orchestration
//!
//! A remote agent service turns a natural-language request into a plan of
//! typed editor actions. This crate parses those plans, holds the resulting
//! actions in an approval queue and drives the multi-turn session protocol in
//! which every action is proposed, approved or rejected, and reported on.
//!
//! # Core Concepts
//!
//! - **Best-effort parsing**: an invalid action descriptor is dropped, never fatal
//! - **Index handles**: callers address queued actions by `ActionIndex` only
//! - **Single writer**: `SessionManager` owns the queue and session state
//! - **Failures don't mutate**: a failed round trip leaves prior state intact
//!
//! # Modules
//!
//! - [`domain`] - Action kinds, planned actions and server records
//! - [`planning`] - Plan/session response parsing and usage tracking
//! - [`queue`] - Action queue and approval store
//! - [`session`] - Session state machine and its actor handle
//! - [`client`] - Transport trait, HTTP transport and endpoint wrapper
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`repl`] - Interactive approval console

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod planning;
pub mod queue;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use client::{AgentApi, AgentTransport, ClientError, HttpTransport, PlanRequest};
pub use config::{AgentConfig, Config, ServerConfig};
pub use domain::{ActionIndex, ActionKind, ActionState, PlannedAction, RiskLevel};
pub use planning::{ContextUsage, ParsedPlan, parse_plan_response, parse_session_response};
pub use queue::{ActionQueue, OutOfRange};
pub use session::{
    Operation, PriorResult, SessionCore, SessionError, SessionManager, SessionSnapshot, SessionState, StepOutcome,
};
