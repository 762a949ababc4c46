//! Domain types for agentplan
//!
//! The action model (a closed union of command kinds plus per-instance
//! approval and outcome state) and the flat records mirrored from the server.

mod action;
mod command;
mod params;
mod records;

pub use action::{ActionIndex, ActionState, DescriptorError, PlannedAction, RiskLevel};
pub use command::{
    ActionKind, COMMAND_IDS, DEFAULT_ACTOR_CLASS, DEFAULT_BRUSH_FALLOFF, DEFAULT_TRANSACTION_DESCRIPTION, KindError,
};
pub use params::{ParamError, Params, Rotator, TARGETS_KEY, Vec2, Vec3};
pub use records::{ChatHistoryEntry, ChatSummary, HealthStatus, ModelOption};
