//! Flat records mirroring server-side chat, model and health state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One conversation known to the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub archived: bool,
}

/// One turn of a stored conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatHistoryEntry {
    pub role: String,
    pub text: String,
    pub provider: String,
    pub model: String,
    /// RFC 3339 timestamp as sent by the server
    pub timestamp: String,
}

impl ChatHistoryEntry {
    /// Parsed timestamp, if the server sent a valid RFC 3339 value
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A selectable provider/model pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelOption {
    pub provider: String,
    pub model: String,
}

impl std::fmt::Display for ModelOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Result of `GET health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthStatus {
    pub ok: bool,
    pub provider: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_summary_missing_fields_default() {
        let chat: ChatSummary = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(chat.id, "c1");
        assert_eq!(chat.title, "");
        assert!(!chat.archived);
    }

    #[test]
    fn test_history_timestamp() {
        let entry = ChatHistoryEntry {
            timestamp: "2025-03-01T12:30:00Z".to_string(),
            ..Default::default()
        };
        let ts = entry.timestamp_utc().unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-03-01T12:30:00+00:00");

        let bad = ChatHistoryEntry {
            timestamp: "yesterday".to_string(),
            ..Default::default()
        };
        assert!(bad.timestamp_utc().is_none());
    }

    #[test]
    fn test_model_option_display() {
        let option = ModelOption {
            provider: "anthropic".to_string(),
            model: "claude-sonnet".to_string(),
        };
        assert_eq!(option.to_string(), "anthropic/claude-sonnet");
    }
}
