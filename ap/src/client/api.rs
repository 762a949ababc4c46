//! Typed endpoint wrapper over an `AgentTransport`

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::wire::{
    ApproveRequest, ArchiveChatRequest, ChatHistoryRequest, ClearCredentialRequest, NextRequest, PlanRequest,
    ResumeRequest, SetCredentialRequest, check_envelope, payload,
};
use super::{AgentTransport, ClientError};
use crate::domain::{ChatHistoryEntry, ChatSummary, HealthStatus, ModelOption};

/// Endpoint paths, relative to the service base URL
pub mod paths {
    pub const HEALTH: &str = "health";
    pub const PLAN: &str = "plan";
    pub const SESSION_START: &str = "session/start";
    pub const SESSION_NEXT: &str = "session/next";
    pub const SESSION_APPROVE: &str = "session/approve";
    pub const SESSION_RESUME: &str = "session/resume";
    pub const MODELS: &str = "models";
    pub const CREDENTIALS_SET: &str = "credentials/set";
    pub const CREDENTIALS_CLEAR: &str = "credentials/clear";
    pub const CHATS: &str = "chats";
    pub const CHAT_HISTORY: &str = "chats/history";
    pub const CHAT_ARCHIVE: &str = "chats/archive";
}

/// Typed access to the agent service endpoints
///
/// Plan and session calls return the raw body: interpreting it is the
/// orchestration core's job. Auxiliary calls check the envelope and return
/// typed payloads.
#[derive(Clone)]
pub struct AgentApi {
    transport: Arc<dyn AgentTransport>,
}

impl AgentApi {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self { transport }
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let body = serde_json::to_value(body)?;
        self.transport.post(path, body).await
    }

    /// `GET health`; an `ok=false` answer is a status, not an error
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        debug!("health: called");
        let body = self.transport.get(paths::HEALTH).await?;
        if !body.is_object() {
            return Err(ClientError::MalformedResponse("expected a JSON object".to_string()));
        }
        serde_json::from_value(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    pub async fn plan(&self, request: &PlanRequest) -> Result<Value, ClientError> {
        debug!(prompt_len = request.prompt.len(), targets = request.targets().len(), "plan: called");
        self.post(paths::PLAN, request).await
    }

    pub async fn session_start(&self, request: &PlanRequest) -> Result<Value, ClientError> {
        debug!(prompt_len = request.prompt.len(), targets = request.targets().len(), "session_start: called");
        self.post(paths::SESSION_START, request).await
    }

    pub async fn session_next(&self, request: &NextRequest) -> Result<Value, ClientError> {
        debug!(session_id = %request.session_id, has_result = request.has_result, "session_next: called");
        self.post(paths::SESSION_NEXT, request).await
    }

    pub async fn session_approve(&self, request: &ApproveRequest) -> Result<Value, ClientError> {
        debug!(
            session_id = %request.session_id,
            action_index = ?request.action_index,
            approved = request.approved,
            "session_approve: called"
        );
        self.post(paths::SESSION_APPROVE, request).await
    }

    pub async fn session_resume(&self, request: &ResumeRequest) -> Result<Value, ClientError> {
        debug!(session_id = %request.session_id, "session_resume: called");
        self.post(paths::SESSION_RESUME, request).await
    }

    pub async fn list_models(&self) -> Result<Vec<ModelOption>, ClientError> {
        debug!("list_models: called");
        let body = self.transport.get(paths::MODELS).await?;
        check_envelope(&body)?;
        payload(&body, "models")
    }

    pub async fn set_credential(&self, provider: &str, api_key: &str) -> Result<(), ClientError> {
        debug!(%provider, "set_credential: called");
        let body = self.post(paths::CREDENTIALS_SET, &SetCredentialRequest { provider, api_key }).await?;
        check_envelope(&body)
    }

    pub async fn clear_credential(&self, provider: &str) -> Result<(), ClientError> {
        debug!(%provider, "clear_credential: called");
        let body = self.post(paths::CREDENTIALS_CLEAR, &ClearCredentialRequest { provider }).await?;
        check_envelope(&body)
    }

    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>, ClientError> {
        debug!("list_chats: called");
        let body = self.transport.get(paths::CHATS).await?;
        check_envelope(&body)?;
        payload(&body, "chats")
    }

    pub async fn chat_history(&self, chat_id: &str) -> Result<Vec<ChatHistoryEntry>, ClientError> {
        debug!(%chat_id, "chat_history: called");
        let body = self.post(paths::CHAT_HISTORY, &ChatHistoryRequest { chat_id }).await?;
        check_envelope(&body)?;
        payload(&body, "entries")
    }

    pub async fn archive_chat(&self, chat_id: &str, archived: bool) -> Result<(), ClientError> {
        debug!(%chat_id, archived, "archive_chat: called");
        let body = self.post(paths::CHAT_ARCHIVE, &ArchiveChatRequest { chat_id, archived }).await?;
        check_envelope(&body)
    }
}
