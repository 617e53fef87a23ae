use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority of a single checklist step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepPriority {
    High,
    Medium,
    Low,
}

/// One actionable step in a troubleshooting checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistStep {
    /// 1-based position within the checklist.
    pub order: u32,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    pub priority: StepPriority,
    #[serde(default)]
    pub commands: Vec<String>,
}

/// The rendered troubleshooting checklist for one alert.
///
/// This is the stable wire form returned from the HTTP surface and posted to
/// destinations; field names are part of the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub alert_id: String,
    pub summary: String,
    pub steps: Vec<ChecklistStep>,
    pub source_runbooks: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub llm_provider_used: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_roundtrip_is_a_fixed_point() {
        let canonical = serde_json::json!({
            "alertId": "cw-1234",
            "summary": "High memory usage on i-1",
            "steps": [{
                "order": 1,
                "instruction": "Check memory usage with free -h",
                "rationale": "Identify which processes hold memory",
                "currentValue": "92%",
                "expectedValue": "< 80%",
                "priority": "HIGH",
                "commands": ["free -h"]
            }],
            "sourceRunbooks": ["runbooks/memory-troubleshooting.md"],
            "generatedAt": "2024-05-04T10:00:00Z",
            "llmProviderUsed": "ollama"
        });

        let checklist: Checklist =
            serde_json::from_value(canonical.clone()).expect("deserialize canonical checklist");
        let reserialized = serde_json::to_value(&checklist).expect("reserialize checklist");

        assert_eq!(canonical, reserialized);
    }

    #[test]
    fn optional_step_fields_are_omitted_when_absent() {
        let step = ChecklistStep {
            order: 1,
            instruction: "Restart the agent".to_string(),
            rationale: None,
            current_value: None,
            expected_value: None,
            priority: StepPriority::Medium,
            commands: Vec::new(),
        };

        let value = serde_json::to_value(&step).expect("serialize step");
        assert!(value.get("rationale").is_none());
        assert_eq!(value["priority"], "MEDIUM");
    }
}
