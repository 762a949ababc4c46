//! Integration tests for agentplan
//!
//! These tests drive the public API end to end over a scripted transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use agentplan::client::{AgentTransport, ClientError, PlanRequest};
use agentplan::domain::ActionIndex;
use agentplan::session::{PriorResult, SessionError, SessionManager, SessionState};
use agentplan::{ActionKind, ActionState, parse_plan_response};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Answers requests from a script and records what was sent
#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value, ClientError>>>,
    sent: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<Value, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    fn answer(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.sent.lock().expect("lock poisoned").push((path.to_string(), body));
        self.script
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::TransportUnreachable("script exhausted".to_string())))
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.answer(path, Value::Null)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.answer(path, body)
    }
}

// =============================================================================
// Plan parsing
// =============================================================================

#[test]
fn test_plan_drops_unknown_command() {
    let body = json!({
        "ok": true,
        "plan": {
            "summary": "Move selected",
            "steps": ["step1"],
            "actions": [
                {"command": "scene.modifyActor", "params": {"deltaLocation": {"x": 10, "y": 0, "z": 0}}},
                {"command": "bogus.command", "params": {}}
            ]
        }
    });

    let plan = parse_plan_response(&body).expect("plan should parse");
    assert_eq!(plan.actions.len(), 1);
    assert_eq!(plan.message, "Move selected\n1. step1\n");
    match plan.actions[0].kind() {
        ActionKind::ModifyActor { delta_location, .. } => assert_eq!(delta_location.x, 10.0),
        other => panic!("unexpected kind {:?}", other),
    }
}

// =============================================================================
// Session manager
// =============================================================================

#[tokio::test]
async fn test_plan_then_execute_queue() {
    let transport = ScriptedTransport::new(vec![Ok(json!({
        "ok": true,
        "plan": {
            "summary": "Stage the scene",
            "actions": [
                {"command": "session.beginTransaction", "params": {"description": "Stage"}},
                {"command": "scene.createActor", "params": {"count": 0}},
                {"command": "scene.createActor", "params": {"actorClass": "PointLight", "count": 2}},
                {"command": "scene.setFolder", "params": {}},
                {"command": "session.commitTransaction", "params": {}}
            ]
        },
        "usage": {"label": "1.2k / 8k", "tooltip": "Context window"}
    }))]);
    let manager = SessionManager::spawn(transport.clone());

    let outcome = manager.plan(PlanRequest::new("Stage")).await.expect("plan should succeed");
    assert_eq!(outcome.queued, 3);
    assert_eq!(outcome.dropped, 2);

    // An executor walks the queue by index
    while let Some(index) = manager.next_pending_index().await.expect("actor alive") {
        manager.record_outcome(index, true, 1).await.expect("actor alive");
    }

    let snapshot = manager.snapshot().await.expect("actor alive");
    assert!(snapshot.actions.iter().all(|a| a.state() == ActionState::Succeeded));
    assert_eq!(snapshot.usage.label(), "1.2k / 8k");
    assert_eq!(snapshot.usage.tooltip(), "Context window");
    assert_eq!(transport.sent()[0].0, "plan");

    manager.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_session_negotiation() {
    let transport = ScriptedTransport::new(vec![
        Ok(json!({
            "ok": true,
            "sessionId": "s1",
            "actionIndex": 0,
            "action": {"command": "scene.deleteActor", "params": {"targetActors": ["Crate"]}, "risk": "high"}
        })),
        Ok(json!({
            "ok": true,
            "sessionId": "s1",
            "actionIndex": 1,
            "action": {"command": "scene.addTag", "params": {"tag": "keep", "targetActors": ["Crate"]}}
        })),
        Ok(json!({"ok": true, "sessionId": "s1", "actionIndex": 1, "message": "Tagging approved"})),
    ]);
    let manager = SessionManager::spawn(transport.clone());

    let request = PlanRequest::new("Clean up").with_targets(vec!["Crate".to_string()]);
    let started = manager.start(request).await.expect("start");
    assert_eq!(started.state, SessionState::AwaitingApproval);

    let rejected = manager.approve(false).await.expect("reject");
    assert_eq!(rejected.current, Some(ActionIndex(1)));
    let first = manager.get_action(ActionIndex(0)).await.expect("first action");
    assert!(!first.approved());

    let done = manager.approve(true).await.expect("approve");
    assert_eq!(done.message, "Tagging approved");
    assert_eq!(done.state, SessionState::Idle);

    let sent = transport.sent();
    let paths: Vec<&str> = sent.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, ["session/start", "session/approve", "session/approve"]);
    assert_eq!(sent[0].1["context"]["selection"], json!(["Crate"]));
    assert_eq!(sent[1].1, json!({"sessionId": "s1", "actionIndex": 0, "approved": false}));
    assert_eq!(sent[2].1, json!({"sessionId": "s1", "actionIndex": 1, "approved": true}));

    let popped = manager.pop_approved().await.expect("pop");
    assert_eq!(popped.len(), 1);
    assert_eq!(popped[0].command(), "scene.addTag");
    assert_eq!(manager.count().await.expect("count"), 1);
}

#[tokio::test]
async fn test_next_reports_prior_result() {
    let transport = ScriptedTransport::new(vec![
        Ok(json!({
            "ok": true,
            "sessionId": "s7",
            "actionIndex": 0,
            "action": {"command": "editor.undo", "params": {"steps": 2}}
        })),
        Ok(json!({"ok": false, "error": "Session expired"})),
    ]);
    let manager = SessionManager::spawn(transport.clone());

    manager.start(PlanRequest::new("Undo twice")).await.expect("start");
    let err = manager
        .next(Some(PriorResult::succeeded("Undid 2 steps")))
        .await
        .expect_err("server rejects");
    assert_eq!(err.to_string(), "Session expired");

    let snapshot = manager.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.session_id.as_deref(), Some("s7"));
    assert_eq!(snapshot.state, SessionState::AwaitingApproval);

    let sent = transport.sent();
    assert_eq!(
        sent[1].1,
        json!({"sessionId": "s7", "hasResult": true, "resultOk": true, "resultMessage": "Undid 2 steps"})
    );
}

#[tokio::test]
async fn test_resume_unknown_session_leaves_queue() {
    let transport = ScriptedTransport::new(vec![
        Ok(json!({"ok": true, "plan": {"summary": "One", "actions": [{"command": "editor.redo", "params": {}}]}})),
        Ok(json!({"ok": false, "error": "No such session", "code": "session_not_found"})),
    ]);
    let manager = SessionManager::spawn(transport);

    manager.plan(PlanRequest::new("Redo")).await.expect("plan");
    let err = manager.resume(Some("stale".to_string())).await.expect_err("unknown session");

    assert!(matches!(err, SessionError::SessionNotFound(ref id) if id == "stale"));
    assert_eq!(manager.count().await.expect("count"), 1);
    assert_eq!(manager.snapshot().await.expect("snapshot").state, SessionState::Idle);
}

#[tokio::test]
async fn test_unreachable_service_reports_failure() {
    let transport = ScriptedTransport::new(vec![]);
    let manager = SessionManager::spawn(transport);

    let err = manager.plan(PlanRequest::new("Anything")).await.expect_err("no script");
    assert!(matches!(err, SessionError::Client(ClientError::TransportUnreachable(_))));
    assert_eq!(manager.count().await.expect("count"), 0);
}
