//! SessionManager - actor that owns the SessionCore
//!
//! Callers talk to the core through a cloneable handle. Server round trips
//! run in spawned tasks and report back over a completion channel, so queue
//! reads and writes are answered while a request is outstanding.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::messages::{PriorResult, SessionCommand, SessionError, SessionResponse, SessionSnapshot, StepOutcome};
use super::state::{PendingRequest, SessionCore};
use crate::client::{AgentApi, AgentTransport, ClientError, PlanRequest};
use crate::domain::{ActionIndex, PlannedAction};

/// A finished server call waiting to be applied by the actor
struct Completion {
    pending: PendingRequest,
    result: Result<Value, ClientError>,
    reply: oneshot::Sender<SessionResponse<StepOutcome>>,
}

/// Handle to send commands to the SessionManager
#[derive(Clone)]
pub struct SessionManager {
    tx: mpsc::Sender<SessionCommand>,
    api: AgentApi,
}

impl SessionManager {
    /// Spawn a new SessionManager actor over `transport`
    pub fn spawn(transport: Arc<dyn AgentTransport>) -> Self {
        debug!("spawn: called");
        let api = AgentApi::new(transport);
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(actor_loop(SessionCore::new(), api.clone(), rx));

        info!("SessionManager spawned");
        Self { tx, api }
    }

    /// Typed access to the auxiliary endpoints
    pub fn api(&self) -> &AgentApi {
        &self.api
    }

    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)
    }

    // === Server round trips ===

    /// One-shot plan; replaces the queue and closes any open session
    pub async fn plan(&self, request: PlanRequest) -> SessionResponse<StepOutcome> {
        debug!(prompt_len = request.prompt.len(), "plan: called");
        self.call(|reply| SessionCommand::Plan { request, reply }).await?
    }

    /// Open a session; the queue is replaced only if the server accepts
    pub async fn start(&self, request: PlanRequest) -> SessionResponse<StepOutcome> {
        debug!(prompt_len = request.prompt.len(), "start: called");
        self.call(|reply| SessionCommand::Start { request, reply }).await?
    }

    /// Report the previous action's outcome (if any) and ask for the next one
    pub async fn next(&self, prior: Option<PriorResult>) -> SessionResponse<StepOutcome> {
        debug!(has_prior = prior.is_some(), "next: called");
        self.call(|reply| SessionCommand::Next { prior, reply }).await?
    }

    /// Relay the decision for the action awaiting approval
    pub async fn approve(&self, approved: bool) -> SessionResponse<StepOutcome> {
        debug!(approved, "approve: called");
        self.call(|reply| SessionCommand::Approve { approved, reply }).await?
    }

    /// Re-synchronise with `session_id`, or the stored session when None
    pub async fn resume(&self, session_id: Option<String>) -> SessionResponse<StepOutcome> {
        debug!(?session_id, "resume: called");
        self.call(|reply| SessionCommand::Resume { session_id, reply }).await?
    }

    // === Queue operations ===

    pub async fn count(&self) -> SessionResponse<usize> {
        debug!("count: called");
        self.call(|reply| SessionCommand::Count { reply }).await
    }

    pub async fn get_action(&self, index: ActionIndex) -> SessionResponse<PlannedAction> {
        debug!(%index, "get_action: called");
        self.call(|reply| SessionCommand::GetAction { index, reply }).await?
    }

    pub async fn preview_text(&self, index: ActionIndex) -> SessionResponse<String> {
        debug!(%index, "preview_text: called");
        self.call(|reply| SessionCommand::Preview { index, reply }).await?
    }

    pub async fn set_approved(&self, index: ActionIndex, approved: bool) -> SessionResponse<()> {
        debug!(%index, approved, "set_approved: called");
        self.call(|reply| SessionCommand::SetApproved { index, approved, reply })
            .await?
    }

    pub async fn pop_approved(&self) -> SessionResponse<Vec<PlannedAction>> {
        debug!("pop_approved: called");
        self.call(|reply| SessionCommand::PopApproved { reply }).await
    }

    pub async fn clear_queue(&self) -> SessionResponse<()> {
        debug!("clear_queue: called");
        self.call(|reply| SessionCommand::ClearQueue { reply }).await
    }

    /// Record an execution outcome; a stale index is ignored
    pub async fn record_outcome(&self, index: ActionIndex, succeeded: bool, attempt_count: u32) -> SessionResponse<()> {
        debug!(%index, succeeded, attempt_count, "record_outcome: called");
        self.call(|reply| SessionCommand::RecordOutcome {
            index,
            succeeded,
            attempt_count,
            reply,
        })
        .await
    }

    pub async fn next_pending_index(&self) -> SessionResponse<Option<ActionIndex>> {
        debug!("next_pending_index: called");
        self.call(|reply| SessionCommand::NextPending { reply }).await
    }

    // === Whole state ===

    /// Forget queue, session and usage
    pub async fn reset(&self) -> SessionResponse<()> {
        debug!("reset: called");
        self.call(|reply| SessionCommand::Reset { reply }).await
    }

    pub async fn snapshot(&self) -> SessionResponse<SessionSnapshot> {
        debug!("snapshot: called");
        self.call(|reply| SessionCommand::Snapshot { reply }).await
    }

    /// Shutdown the SessionManager; outstanding requests are abandoned
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        debug!("shutdown: called");
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::ChannelError)
    }
}

/// Run an admitted request in the background and report back to the actor
fn dispatch(
    api: &AgentApi,
    done_tx: &mpsc::UnboundedSender<Completion>,
    admitted: SessionResponse<PendingRequest>,
    reply: oneshot::Sender<SessionResponse<StepOutcome>>,
) {
    let pending = match admitted {
        Ok(pending) => pending,
        Err(e) => {
            debug!(error = %e, "dispatch: request not admitted");
            let _ = reply.send(Err(e));
            return;
        }
    };

    let api = api.clone();
    let done_tx = done_tx.clone();
    tokio::spawn(async move {
        debug!(operation = %pending.operation(), "dispatch: sending request");
        let result = match &pending {
            PendingRequest::Plan(request) => api.plan(request).await,
            PendingRequest::Start(request) => api.session_start(request).await,
            PendingRequest::Next(request) => api.session_next(request).await,
            PendingRequest::Approve(request) => api.session_approve(request).await,
            PendingRequest::Resume(request) => api.session_resume(request).await,
        };
        let _ = done_tx.send(Completion { pending, result, reply });
    });
}

/// The actor loop that owns the core
async fn actor_loop(mut core: SessionCore, api: AgentApi, mut rx: mpsc::Receiver<SessionCommand>) {
    debug!("actor_loop: called");
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

    loop {
        tokio::select! {
            Some(done) = done_rx.recv() => {
                debug!(operation = %done.pending.operation(), "actor_loop: completion");
                let outcome = core.complete(done.pending, done.result);
                let _ = done.reply.send(outcome);
            }
            cmd = rx.recv() => {
                let Some(cmd) = cmd else {
                    debug!("actor_loop: all handles dropped");
                    break;
                };
                match cmd {
                    SessionCommand::Plan { request, reply } => {
                        debug!("actor_loop: Plan command");
                        dispatch(&api, &done_tx, core.begin_plan(request), reply);
                    }
                    SessionCommand::Start { request, reply } => {
                        debug!("actor_loop: Start command");
                        dispatch(&api, &done_tx, core.begin_start(request), reply);
                    }
                    SessionCommand::Next { prior, reply } => {
                        debug!("actor_loop: Next command");
                        dispatch(&api, &done_tx, core.begin_next(prior), reply);
                    }
                    SessionCommand::Approve { approved, reply } => {
                        debug!(approved, "actor_loop: Approve command");
                        dispatch(&api, &done_tx, core.begin_approve(approved), reply);
                    }
                    SessionCommand::Resume { session_id, reply } => {
                        debug!(?session_id, "actor_loop: Resume command");
                        dispatch(&api, &done_tx, core.begin_resume(session_id), reply);
                    }

                    SessionCommand::Count { reply } => {
                        let _ = reply.send(core.queue().count());
                    }
                    SessionCommand::GetAction { index, reply } => {
                        let _ = reply.send(core.get(index).map_err(SessionError::from));
                    }
                    SessionCommand::Preview { index, reply } => {
                        let _ = reply.send(core.preview_text(index).map_err(SessionError::from));
                    }
                    SessionCommand::SetApproved { index, approved, reply } => {
                        debug!(%index, approved, "actor_loop: SetApproved command");
                        let _ = reply.send(core.set_approved(index, approved).map_err(SessionError::from));
                    }
                    SessionCommand::PopApproved { reply } => {
                        debug!("actor_loop: PopApproved command");
                        let _ = reply.send(core.pop_approved());
                    }
                    SessionCommand::ClearQueue { reply } => {
                        debug!("actor_loop: ClearQueue command");
                        core.clear_queue();
                        let _ = reply.send(());
                    }
                    SessionCommand::RecordOutcome {
                        index,
                        succeeded,
                        attempt_count,
                        reply,
                    } => {
                        debug!(%index, succeeded, "actor_loop: RecordOutcome command");
                        core.record_outcome(index, succeeded, attempt_count);
                        let _ = reply.send(());
                    }
                    SessionCommand::NextPending { reply } => {
                        let _ = reply.send(core.next_pending_index());
                    }

                    SessionCommand::Reset { reply } => {
                        debug!("actor_loop: Reset command");
                        core.reset();
                        let _ = reply.send(());
                    }
                    SessionCommand::Snapshot { reply } => {
                        let _ = reply.send(core.snapshot());
                    }
                    SessionCommand::Shutdown => {
                        debug!("actor_loop: Shutdown command");
                        break;
                    }
                }
            }
        }
    }

    info!("SessionManager actor stopped");
}
