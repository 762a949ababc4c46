//! Session state and the synchronous transition core
//!
//! `SessionCore` owns the queue, the session identity and the usage tracker.
//! Every server round trip is split in two: a `begin_*` call checks
//! preconditions and builds the request, and `complete` applies the response.
//! A failed response only clears the in-flight marker.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::messages::{Operation, PriorResult, SessionError, SessionResponse, SessionSnapshot, StepOutcome};
use crate::client::{ApproveRequest, ClientError, NextRequest, PlanRequest, ResumeRequest};
use crate::domain::{ActionIndex, PlannedAction};
use crate::planning::{ContextUsage, SessionStep, parse_plan_response, parse_session_response};
use crate::queue::{ActionQueue, OutOfRange};

/// Lifecycle of the orchestration core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingServer,
    AwaitingApproval,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::AwaitingServer => write!(f, "awaiting-server"),
            SessionState::AwaitingApproval => write!(f, "awaiting-approval"),
        }
    }
}

/// Identity of a server-side negotiation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// None when no session is open
    pub id: Option<String>,
    /// Local queue index of the action awaiting a decision
    pub current: Option<ActionIndex>,
    /// Server index of the action awaiting a decision, when the server gave one
    pub server_index: Option<usize>,
    /// The server is waiting for a decision on a proposed action
    pub awaiting_decision: bool,
    /// Actor names the session was opened against
    pub targets: Vec<String>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.id.is_some()
    }

    pub fn close(&mut self) {
        debug!(id = ?self.id, "close: called");
        *self = Self::default();
    }

    fn clear_current(&mut self) {
        self.current = None;
        self.server_index = None;
        self.awaiting_decision = false;
    }
}

/// A request that has been admitted and is waiting for the server
#[derive(Debug, Clone, PartialEq)]
pub enum PendingRequest {
    Plan(PlanRequest),
    Start(PlanRequest),
    Next(NextRequest),
    Approve(ApproveRequest),
    Resume(ResumeRequest),
}

impl PendingRequest {
    pub fn operation(&self) -> Operation {
        match self {
            PendingRequest::Plan(_) => Operation::Plan,
            PendingRequest::Start(_) => Operation::Start,
            PendingRequest::Next(_) => Operation::Next,
            PendingRequest::Approve(_) => Operation::Approve,
            PendingRequest::Resume(_) => Operation::Resume,
        }
    }
}

const SESSION_COMPLETE: &str = "Session complete";
const ACTION_NOT_RECOGNISED: &str = "The proposed action was not recognised and has been skipped";

/// Single-writer owner of queue, session and usage
#[derive(Debug, Default)]
pub struct SessionCore {
    queue: ActionQueue,
    session: Session,
    usage: ContextUsage,
    in_flight: Option<Operation>,
}

impl SessionCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.in_flight.is_some() {
            SessionState::AwaitingServer
        } else if self.session.is_open() && self.session.awaiting_decision {
            SessionState::AwaitingApproval
        } else {
            SessionState::Idle
        }
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn usage(&self) -> &ContextUsage {
        &self.usage
    }

    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    fn admit(&mut self, operation: Operation) -> SessionResponse<()> {
        if let Some(active) = self.in_flight {
            warn!(%operation, %active, "admit: rejected, operation in flight");
            return Err(SessionError::Busy(active));
        }
        self.in_flight = Some(operation);
        Ok(())
    }

    // === Request side ===

    pub fn begin_plan(&mut self, request: PlanRequest) -> SessionResponse<PendingRequest> {
        debug!(targets = request.targets().len(), "begin_plan: called");
        self.admit(Operation::Plan)?;
        Ok(PendingRequest::Plan(request))
    }

    pub fn begin_start(&mut self, request: PlanRequest) -> SessionResponse<PendingRequest> {
        debug!(targets = request.targets().len(), "begin_start: called");
        self.admit(Operation::Start)?;
        Ok(PendingRequest::Start(request))
    }

    pub fn begin_next(&mut self, prior: Option<PriorResult>) -> SessionResponse<PendingRequest> {
        debug!(has_prior = prior.is_some(), "begin_next: called");
        let session_id = self.session.id.clone().ok_or(SessionError::NoActiveSession)?;
        self.admit(Operation::Next)?;

        let prior = prior.map(|p| (p.ok, p.message));
        Ok(PendingRequest::Next(NextRequest {
            session_id,
            has_result: prior.is_some(),
            result_ok: prior.as_ref().is_some_and(|(ok, _)| *ok),
            result_message: prior.map(|(_, message)| message).unwrap_or_default(),
        }))
    }

    pub fn begin_approve(&mut self, approved: bool) -> SessionResponse<PendingRequest> {
        debug!(approved, "begin_approve: called");
        let session_id = self.session.id.clone().ok_or(SessionError::NoActiveSession)?;
        if !self.session.awaiting_decision {
            return Err(SessionError::NoPendingAction);
        }
        self.admit(Operation::Approve)?;

        Ok(PendingRequest::Approve(ApproveRequest {
            session_id,
            action_index: self.session.server_index,
            approved,
        }))
    }

    /// Resume `session_id`, or the stored session when None
    pub fn begin_resume(&mut self, session_id: Option<String>) -> SessionResponse<PendingRequest> {
        debug!(?session_id, "begin_resume: called");
        let session_id = session_id
            .filter(|id| !id.is_empty())
            .or_else(|| self.session.id.clone())
            .ok_or_else(|| SessionError::SessionNotFound(String::new()))?;
        self.admit(Operation::Resume)?;
        Ok(PendingRequest::Resume(ResumeRequest { session_id }))
    }

    // === Response side ===

    /// Apply the server's answer to an admitted request
    pub fn complete(
        &mut self,
        pending: PendingRequest,
        result: Result<Value, ClientError>,
    ) -> SessionResponse<StepOutcome> {
        debug!(operation = %pending.operation(), ok = result.is_ok(), "complete: called");
        self.in_flight = None;

        let outcome = match pending {
            PendingRequest::Plan(_) => self.apply_plan(result),
            PendingRequest::Start(request) => self.apply_start(request, result),
            PendingRequest::Next(_) => self.apply_next(result),
            PendingRequest::Approve(request) => self.apply_approve(request, result),
            PendingRequest::Resume(request) => self.apply_resume(request, result),
        };

        match &outcome {
            Ok(step) => info!(state = %step.state, queued = step.queued, dropped = step.dropped, "Step applied"),
            Err(e) => warn!(error = %e, "Step failed, state unchanged"),
        }
        outcome
    }

    fn apply_plan(&mut self, result: Result<Value, ClientError>) -> SessionResponse<StepOutcome> {
        let plan = parse_plan_response(&result?)?;

        self.queue.replace(plan.actions);
        self.session.close();
        self.usage.update(plan.usage.as_ref());
        Ok(self.outcome(plan.message, plan.dropped))
    }

    fn apply_start(
        &mut self,
        request: PlanRequest,
        result: Result<Value, ClientError>,
    ) -> SessionResponse<StepOutcome> {
        let mut step = parse_session_response(&result?)?;
        let plan = step.plan.take().unwrap_or_default();

        self.queue.replace(plan.actions);
        self.session = Session {
            id: step.session_id.take(),
            targets: request.targets().to_vec(),
            ..Session::default()
        };
        self.usage.update(step.usage.as_ref());

        if !self.session.is_open() {
            debug!("apply_start: no session id, one-shot plan");
            if let Some(action) = step.action.take() {
                self.queue.upsert(action);
            }
            let message = step.message.take().unwrap_or(plan.message);
            return Ok(self.outcome(message, plan.dropped));
        }

        let fallback = plan.message;
        let dropped = plan.dropped + usize::from(step.action.is_none() && !step.completed);
        let designated = step.action_index.and_then(|i| self.queue.position_of_server_index(i));
        let message = self.apply_proposal(step, designated, Some(fallback));
        Ok(self.outcome(message, dropped))
    }

    fn apply_next(&mut self, result: Result<Value, ClientError>) -> SessionResponse<StepOutcome> {
        let step = parse_session_response(&result?)?;
        Ok(self.apply_step(step))
    }

    fn apply_approve(
        &mut self,
        request: ApproveRequest,
        result: Result<Value, ClientError>,
    ) -> SessionResponse<StepOutcome> {
        let step = parse_session_response(&result?)?;

        if !request.approved {
            let rejected = match request.action_index {
                Some(server_index) => self.queue.position_of_server_index(server_index),
                None => self.session.current,
            };
            match rejected {
                Some(index) => self.queue.set_approved(index, false)?,
                None => debug!(server_index = ?request.action_index, "apply_approve: rejected action no longer queued"),
            }
        }
        Ok(self.apply_step(step))
    }

    fn apply_resume(
        &mut self,
        request: ResumeRequest,
        result: Result<Value, ClientError>,
    ) -> SessionResponse<StepOutcome> {
        let step = match result.and_then(|body| parse_session_response(&body)) {
            Ok(step) => step,
            Err(e) if e.is_not_found() => {
                info!(session_id = %request.session_id, "Session not found on resume");
                self.session.close();
                return Err(SessionError::SessionNotFound(request.session_id));
            }
            Err(e) => return Err(e.into()),
        };

        if self.session.id.as_deref() != Some(request.session_id.as_str()) {
            debug!(session_id = %request.session_id, "apply_resume: adopting a different session, clearing queue");
            self.queue.clear();
            self.session = Session {
                id: Some(request.session_id),
                ..Session::default()
            };
        }
        Ok(self.apply_step(step))
    }

    /// Shared handling of next/approve/resume responses
    fn apply_step(&mut self, mut step: SessionStep) -> StepOutcome {
        if let Some(id) = step.session_id.take() {
            self.session.id = Some(id);
        }
        self.usage.update(step.usage.as_ref());

        let mut dropped = 0;
        let mut designated = None;
        let mut fallback = None;
        if let Some(plan) = step.plan.take() {
            debug!(actions = plan.actions.len(), "apply_step: response carries a plan, replacing queue");
            self.queue.replace(plan.actions);
            self.session.clear_current();
            dropped += plan.dropped;
            designated = step.action_index.and_then(|i| self.queue.position_of_server_index(i));
            fallback = Some(plan.message);
        }
        if step.action.is_none() && !step.completed {
            dropped += 1;
        }

        let message = self.apply_proposal(step, designated, fallback);
        self.outcome(message, dropped)
    }

    /// Point the session at the proposed action, or close it on completion
    fn apply_proposal(
        &mut self,
        step: SessionStep,
        designated: Option<ActionIndex>,
        fallback: Option<String>,
    ) -> String {
        if let Some(action) = step.action {
            let index = self.queue.upsert(action);
            let server_index = self.queue.get(index).ok().and_then(PlannedAction::server_index);
            self.session.current = Some(index);
            self.session.server_index = server_index;
            self.session.awaiting_decision = true;
            debug!(%index, ?server_index, "apply_proposal: awaiting approval");
            let preview = self.queue.preview_text(index).unwrap_or_default();
            return step.message.unwrap_or_else(|| format!("Proposed: {}", preview));
        }

        if let Some(index) = designated {
            self.session.current = Some(index);
            self.session.server_index = self.queue.get(index).ok().and_then(PlannedAction::server_index);
            self.session.awaiting_decision = true;
            debug!(%index, "apply_proposal: server designated a queued action");
            return step.message.or(fallback).unwrap_or_default();
        }

        if step.completed {
            self.session.close();
            return step.message.or(fallback).unwrap_or_else(|| SESSION_COMPLETE.to_string());
        }

        debug!("apply_proposal: proposed action dropped, session stays open");
        self.session.clear_current();
        step.message.unwrap_or_else(|| ACTION_NOT_RECOGNISED.to_string())
    }

    fn outcome(&self, message: String, dropped: usize) -> StepOutcome {
        StepOutcome {
            message,
            state: self.state(),
            session_id: self.session.id.clone(),
            current: self.session.current,
            queued: self.queue.count(),
            dropped,
        }
    }

    // === Queue access ===

    pub fn get(&self, index: ActionIndex) -> Result<PlannedAction, OutOfRange> {
        self.queue.get(index).cloned()
    }

    pub fn preview_text(&self, index: ActionIndex) -> Result<String, OutOfRange> {
        self.queue.preview_text(index)
    }

    pub fn set_approved(&mut self, index: ActionIndex, approved: bool) -> Result<(), OutOfRange> {
        self.queue.set_approved(index, approved)
    }

    /// Pop approved actions, re-pointing the session at its action's new position
    ///
    /// The remap is positional, so it holds whether or not the server gave
    /// the action an index. A popped current action leaves `current` empty.
    pub fn pop_approved(&mut self) -> Vec<PlannedAction> {
        let current = self.session.current.and_then(|index| self.queue.position_after_pop(index));
        let popped = self.queue.pop_approved();
        self.session.current = current;
        debug!(popped = popped.len(), current = ?self.session.current, "pop_approved: called");
        popped
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.session.current = None;
    }

    pub fn record_outcome(&mut self, index: ActionIndex, succeeded: bool, attempt_count: u32) {
        self.queue.record_outcome(index, succeeded, attempt_count);
    }

    pub fn next_pending_index(&self) -> Option<ActionIndex> {
        self.queue.next_pending_index()
    }

    /// Drop queue, session and usage; an in-flight request still completes
    pub fn reset(&mut self) {
        debug!("reset: called");
        self.queue.clear();
        self.session.close();
        self.usage = ContextUsage::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            session_id: self.session.id.clone(),
            current: self.session.current,
            targets: self.session.targets.clone(),
            actions: self.queue.snapshot(),
            usage: self.usage.clone(),
        }
    }
}
