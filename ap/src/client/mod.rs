//! Agent service client
//!
//! `AgentTransport` is the seam between the orchestration core and HTTP:
//! one request in, one JSON body (or `ClientError`) out. `AgentApi` layers
//! the endpoint paths and typed payloads on top.

use async_trait::async_trait;
use serde_json::Value;

mod api;
mod error;
mod http;
pub mod wire;

pub use api::AgentApi;
pub use error::{ClientError, SESSION_NOT_FOUND_CODE};
pub use http::{HttpTransport, connect};
pub use wire::{ApproveRequest, DEFAULT_SERVER_ERROR, NextRequest, PlanContext, PlanRequest, ResumeRequest};

/// One-request-at-a-time JSON transport to the agent service
///
/// Implementations map connection failures to `TransportUnreachable`,
/// non-2xx statuses to `HttpStatus` and unparseable bodies to
/// `MalformedResponse`. They never retry.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// `GET <path>`
    async fn get(&self, path: &str) -> Result<Value, ClientError>;

    /// `POST <path>` with a JSON body
    async fn post(&self, path: &str, body: Value) -> Result<Value, ClientError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tracing::debug;

    /// Scripted transport for unit tests
    ///
    /// Answers each request with the next scripted response, in order, and
    /// records every `(path, body)` it sees.
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<Value, ClientError>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl MockTransport {
        pub fn new(responses: Vec<Result<Value, ClientError>>) -> Self {
            debug!(response_count = %responses.len(), "MockTransport::new: called");
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn next(&self, path: &str, body: Value) -> Result<Value, ClientError> {
            debug!(%path, "MockTransport::next: called");
            self.calls.lock().unwrap().push((path.to_string(), body));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::TransportUnreachable("No more mock responses".to_string())))
        }
    }

    #[async_trait]
    impl AgentTransport for MockTransport {
        async fn get(&self, path: &str) -> Result<Value, ClientError> {
            self.next(path, Value::Null)
        }

        async fn post(&self, path: &str, body: Value) -> Result<Value, ClientError> {
            self.next(path, body)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[tokio::test]
        async fn test_mock_transport_returns_responses_in_order() {
            let transport = MockTransport::new(vec![Ok(json!({"ok": true, "n": 1})), Ok(json!({"ok": true, "n": 2}))]);

            let first = transport.get("health").await.unwrap();
            assert_eq!(first["n"], json!(1));

            let second = transport.post("plan", json!({"prompt": "x"})).await.unwrap();
            assert_eq!(second["n"], json!(2));

            let calls = transport.calls();
            assert_eq!(calls.len(), 2);
            assert_eq!(calls[1].0, "plan");
            assert_eq!(calls[1].1["prompt"], json!("x"));
        }

        #[tokio::test]
        async fn test_mock_transport_errors_when_exhausted() {
            let transport = MockTransport::new(vec![]);
            let result = transport.get("health").await;
            assert!(matches!(result, Err(ClientError::TransportUnreachable(_))));
        }
    }
}
