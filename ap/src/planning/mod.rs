//! Plan parsing and context-usage tracking

mod parser;
mod usage;

pub use parser::{ParsedPlan, SessionStep, display_message, parse_actions, parse_plan_response, parse_session_response};
pub use usage::{ContextUsage, UsageReport};
