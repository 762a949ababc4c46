//! Context-usage bookkeeping
//!
//! Keeps the latest human-readable token/budget strings reported alongside
//! plan and session responses.

use serde_json::Value;
use tracing::debug;

/// Usage strings extracted from one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageReport {
    pub label: String,
    pub tooltip: String,
}

impl UsageReport {
    /// Read `usage: {label?, tooltip?, usedTokens?, maxTokens?}`
    ///
    /// Without a `label`, both token counts are needed to render one.
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        let obj = value?.as_object()?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(label) = text("label") {
            return Some(Self {
                tooltip: text("tooltip").unwrap_or_default(),
                label,
            });
        }

        let used = obj.get("usedTokens").and_then(Value::as_u64)?;
        let max = obj.get("maxTokens").and_then(Value::as_u64)?;
        let percent = if max == 0 { 0 } else { used.saturating_mul(100) / max };
        debug!(used, max, percent, "from_value: rendering label from token counts");
        Some(Self {
            label: format!("{}/{} tokens ({}%)", used, max, percent),
            tooltip: text("tooltip").unwrap_or_else(|| format!("Context: {} of {} tokens used", used, max)),
        })
    }
}

/// Latest usage strings; absent metadata leaves prior values in place
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextUsage {
    label: String,
    tooltip: String,
}

impl ContextUsage {
    pub fn update(&mut self, report: Option<&UsageReport>) {
        if let Some(report) = report {
            debug!(label = %report.label, "update: called");
            self.label = report.label.clone();
            self.tooltip = report.tooltip.clone();
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }
}
