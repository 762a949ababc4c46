//! Request bodies and envelope checks for the agent service protocol

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::ClientError;

/// Message used when the server rejects a request without saying why
pub const DEFAULT_SERVER_ERROR: &str = "Agent service reported an error";

/// Body of `POST plan` and `POST session/start`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub prompt: String,
    pub mode: String,
    pub context: PlanContext,
    pub provider: String,
    pub model: String,
}

/// Editor context sent along with a prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanContext {
    /// Names of the actors selected when the request was made
    pub selection: Vec<String>,
}

impl PlanRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.context.selection = targets;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn targets(&self) -> &[String] {
        &self.context.selection
    }
}

/// Body of `POST session/next`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRequest {
    pub session_id: String,
    pub has_result: bool,
    pub result_ok: bool,
    pub result_message: String,
}

/// Body of `POST session/approve`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub session_id: String,
    /// Server index of the action decided on; omitted when the server never gave one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_index: Option<usize>,
    pub approved: bool,
}

/// Body of `POST session/resume`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetCredentialRequest<'a> {
    pub provider: &'a str,
    pub api_key: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClearCredentialRequest<'a> {
    pub provider: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatHistoryRequest<'a> {
    pub chat_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArchiveChatRequest<'a> {
    pub chat_id: &'a str,
    pub archived: bool,
}

/// Verify the `{ok, error?, code?}` envelope
///
/// A body that is not an object is malformed. A missing or false `ok` is a
/// rejection carrying the server's `error` text, or `DEFAULT_SERVER_ERROR`.
pub fn check_envelope(body: &Value) -> Result<(), ClientError> {
    let obj = body
        .as_object()
        .ok_or_else(|| ClientError::MalformedResponse("expected a JSON object".to_string()))?;

    if obj.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }

    let message = obj
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SERVER_ERROR)
        .to_string();
    let code = obj.get("code").and_then(Value::as_str).map(str::to_string);
    debug!(%message, ?code, "check_envelope: server rejected request");
    Err(ClientError::ServerRejected { message, code })
}

/// Extract a typed payload field from a checked envelope; absent means default
pub fn payload<T>(body: &Value, key: &str) -> Result<T, ClientError>
where
    T: DeserializeOwned + Default,
{
    match body.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ClientError::MalformedResponse(format!("field '{}': {}", key, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_request_wire_shape() {
        let request = PlanRequest::new("Move selected")
            .with_mode("plan")
            .with_targets(vec!["Cube".to_string()])
            .with_provider("anthropic")
            .with_model("claude");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "prompt": "Move selected",
                "mode": "plan",
                "context": {"selection": ["Cube"]},
                "provider": "anthropic",
                "model": "claude"
            })
        );
    }

    #[test]
    fn test_session_bodies_are_camel_case() {
        let body = serde_json::to_value(ApproveRequest {
            session_id: "s1".to_string(),
            action_index: Some(2),
            approved: false,
        })
        .unwrap();
        assert_eq!(body, json!({"sessionId": "s1", "actionIndex": 2, "approved": false}));

        let body = serde_json::to_value(ApproveRequest {
            session_id: "s1".to_string(),
            action_index: None,
            approved: true,
        })
        .unwrap();
        assert_eq!(body, json!({"sessionId": "s1", "approved": true}));

        let body = serde_json::to_value(NextRequest {
            session_id: "s1".to_string(),
            has_result: true,
            result_ok: false,
            result_message: "Actor not found".to_string(),
        })
        .unwrap();
        assert_eq!(body["hasResult"], json!(true));
        assert_eq!(body["resultMessage"], json!("Actor not found"));
    }

    #[test]
    fn test_check_envelope() {
        assert!(check_envelope(&json!({"ok": true})).is_ok());

        let err = check_envelope(&json!({"ok": false, "error": "No provider"})).unwrap_err();
        assert_eq!(err.to_string(), "No provider");

        let err = check_envelope(&json!({"plan": {}})).unwrap_err();
        assert_eq!(err.to_string(), DEFAULT_SERVER_ERROR);

        let err = check_envelope(&json!(["ok"])).unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[test]
    fn test_check_envelope_keeps_code() {
        let err = check_envelope(&json!({"ok": false, "code": "session_not_found"})).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_payload() {
        let body = json!({"ok": true, "names": ["a", "b"], "bad": 3});
        let names: Vec<String> = payload(&body, "names").unwrap();
        assert_eq!(names, vec!["a", "b"]);

        let missing: Vec<String> = payload(&body, "other").unwrap();
        assert!(missing.is_empty());

        let bad: Result<Vec<String>, _> = payload(&body, "bad");
        assert!(matches!(bad, Err(ClientError::MalformedResponse(_))));
    }
}
