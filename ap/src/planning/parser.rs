//! Plan and session-step response parsing
//!
//! Plans come from a probabilistic planner, so parsing is best-effort: each
//! action descriptor is validated on its own and an invalid one is dropped
//! without affecting the rest. Only the envelope (`ok`/`error`) can fail a
//! response as a whole.

use serde_json::Value;
use tracing::{debug, info};

use super::usage::UsageReport;
use crate::client::ClientError;
use crate::client::wire::check_envelope;
use crate::domain::PlannedAction;

/// A successfully parsed plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPlan {
    pub summary: String,
    pub steps: Vec<String>,
    /// Valid actions in server order
    pub actions: Vec<PlannedAction>,
    /// Number of descriptors dropped by validation
    pub dropped: usize,
    /// Summary followed by the numbered steps
    pub message: String,
    pub usage: Option<UsageReport>,
}

/// A parsed `session/*` response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStep {
    pub session_id: Option<String>,
    /// The proposed action, tagged with `action_index` as its server index
    pub action: Option<PlannedAction>,
    pub action_index: Option<usize>,
    /// True when the response carried no `action` at all
    pub completed: bool,
    pub message: Option<String>,
    /// Present when the response embeds a plan body (`session/start`)
    pub plan: Option<ParsedPlan>,
    pub usage: Option<UsageReport>,
}

/// Parse a `POST plan` response
pub fn parse_plan_response(body: &Value) -> Result<ParsedPlan, ClientError> {
    debug!("parse_plan_response: called");
    check_envelope(body)?;

    let mut plan = parse_plan_body(body.get("plan"));
    plan.usage = UsageReport::from_value(body.get("usage"));
    info!(
        actions = plan.actions.len(),
        dropped = plan.dropped,
        steps = plan.steps.len(),
        "Parsed plan response"
    );
    Ok(plan)
}

/// Parse a `session/start|next|approve|resume` response
pub fn parse_session_response(body: &Value) -> Result<SessionStep, ClientError> {
    debug!("parse_session_response: called");
    check_envelope(body)?;

    let session_id = body
        .get("sessionId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let action_index = body.get("actionIndex").and_then(Value::as_u64).map(|i| i as usize);
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let (action, completed) = match body.get("action") {
        None | Some(Value::Null) => {
            debug!("parse_session_response: no action, session complete");
            (None, true)
        }
        Some(descriptor) => match PlannedAction::from_descriptor(descriptor) {
            Ok(action) => (Some(action.with_server_index(action_index)), false),
            Err(e) => {
                debug!(error = %e, "parse_session_response: dropped proposed action");
                (None, false)
            }
        },
    };

    let plan = body.get("plan").filter(|p| p.is_object()).map(|p| parse_plan_body(Some(p)));

    Ok(SessionStep {
        session_id,
        action,
        action_index,
        completed,
        message,
        plan,
        usage: UsageReport::from_value(body.get("usage")),
    })
}

/// Parse the inner `{summary, steps, actions}` object; absent means empty
fn parse_plan_body(plan: Option<&Value>) -> ParsedPlan {
    let summary = plan
        .and_then(|p| p.get("summary"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let steps: Vec<String> = plan
        .and_then(|p| p.get("steps"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let (actions, dropped) = parse_actions(plan.and_then(|p| p.get("actions")));
    let message = display_message(&summary, &steps);

    ParsedPlan {
        summary,
        steps,
        actions,
        dropped,
        message,
        usage: None,
    }
}

/// Parse an action descriptor list, returning valid actions and the drop count
///
/// Each action keeps its position in the server's list as its server index.
pub fn parse_actions(list: Option<&Value>) -> (Vec<PlannedAction>, usize) {
    let Some(items) = list.and_then(Value::as_array) else {
        debug!("parse_actions: no action list");
        return (Vec::new(), 0);
    };

    let mut actions = Vec::with_capacity(items.len());
    let mut dropped = 0;
    for (position, descriptor) in items.iter().enumerate() {
        match PlannedAction::from_descriptor(descriptor) {
            Ok(action) => actions.push(action.with_server_index(Some(position))),
            Err(e) => {
                debug!(position, error = %e, "parse_actions: dropped descriptor");
                dropped += 1;
            }
        }
    }
    (actions, dropped)
}

/// Summary, then one numbered line per step
pub fn display_message(summary: &str, steps: &[String]) -> String {
    let mut message = summary.to_string();
    if !steps.is_empty() {
        if !summary.is_empty() {
            message.push('\n');
        }
        for (i, step) in steps.iter().enumerate() {
            message.push_str(&format!("{}. {}\n", i + 1, step));
        }
    }
    message
}
