use regex::Regex;
use serde::Deserialize;

use common::model::{ChecklistStep, StepPriority};

/// Relaxed mirror of the checklist wire schema, tolerating the fields an
/// LLM tends to omit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmChecklist {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    steps: Vec<LlmStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmStep {
    #[serde(default)]
    order: Option<u32>,
    instruction: String,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    current_value: Option<String>,
    #[serde(default)]
    expected_value: Option<String>,
    #[serde(default)]
    priority: Option<StepPriority>,
    #[serde(default)]
    commands: Vec<String>,
}

impl From<LlmStep> for ChecklistStep {
    fn from(step: LlmStep) -> Self {
        Self {
            order: step.order.unwrap_or(0),
            instruction: step.instruction,
            rationale: step.rationale,
            current_value: step.current_value,
            expected_value: step.expected_value,
            priority: step.priority.unwrap_or(StepPriority::Medium),
            commands: step.commands,
        }
    }
}

/// Attempt the structured parse: strict JSON first, then JSON inside a code
/// fence. `None` means the caller should fall back to markdown parsing.
pub fn parse_structured(response: &str) -> Option<(String, Vec<ChecklistStep>)> {
    if let Some(parsed) = try_parse(response.trim()) {
        return Some(parsed);
    }

    extract_fenced_json(response).and_then(try_parse)
}

fn try_parse(candidate: &str) -> Option<(String, Vec<ChecklistStep>)> {
    if candidate.is_empty() {
        return None;
    }

    let parsed = serde_json::from_str::<LlmChecklist>(candidate).ok()?;
    if parsed.steps.is_empty() {
        return None;
    }

    let steps = parsed.steps.into_iter().map(ChecklistStep::from).collect();
    Some((parsed.summary, steps))
}

/// The text between the first fenced code block's delimiters, if any.
fn extract_fenced_json(response: &str) -> Option<&str> {
    let open = response.find("```")?;
    let after_open = &response[open + 3..];
    // Skip an optional language tag such as `json`.
    let content_start = after_open.find('\n')?;
    let content = &after_open[content_start + 1..];
    let close = content.find("```")?;
    Some(content[..close].trim())
}

/// Forgiving secondary parser for non-JSON responses.
///
/// Numbered lines become steps; when no numbered lines exist, any non-blank
/// lines do; a blank response yields a single diagnostic step. The result is
/// never empty, and the parse is pure so behavior under test is
/// deterministic.
pub fn markdown_fallback(response: &str) -> (String, Vec<ChecklistStep>) {
    #[allow(clippy::expect_used)]
    let numbered = Regex::new(r"^\s*(\d+)[.)]\s+(.+)$").expect("static regex");

    let mut steps: Vec<ChecklistStep> = response
        .lines()
        .filter_map(|line| numbered.captures(line))
        .map(|captures| plain_step(captures[2].trim()))
        .collect();

    if steps.is_empty() {
        steps = response
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(plain_step)
            .collect();
    }

    if steps.is_empty() {
        steps.push(plain_step(&format!(
            "The model returned no actionable output; inspect the raw response: {response:?}"
        )));
    }

    let summary = "Checklist reconstructed from unstructured model output".to_string();
    (summary, steps)
}

fn plain_step(instruction: &str) -> ChecklistStep {
    ChecklistStep {
        order: 0,
        instruction: instruction.to_string(),
        rationale: None,
        current_value: None,
        expected_value: None,
        priority: StepPriority::Medium,
        commands: Vec::new(),
    }
}

/// Enforce `steps[i].order == i + 1` regardless of what the model emitted.
pub fn renumber(steps: &mut [ChecklistStep]) {
    for (index, step) in steps.iter_mut().enumerate() {
        step.order = index as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_is_parsed() {
        let response = r#"{
            "summary": "Memory pressure on web-1",
            "steps": [
                {"order": 1, "instruction": "Run free -h", "priority": "HIGH", "commands": ["free -h"]},
                {"order": 2, "instruction": "Check oom-killer", "priority": "MEDIUM", "commands": []}
            ]
        }"#;

        let (summary, steps) = parse_structured(response).expect("structured parse");
        assert_eq!(summary, "Memory pressure on web-1");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].instruction, "Run free -h");
        assert_eq!(steps[0].priority, StepPriority::High);
    }

    #[test]
    fn fenced_json_is_parsed() {
        let response = "Here is the checklist:\n```json\n{\"summary\": \"s\", \"steps\": [{\"instruction\": \"Check disk\"}]}\n```\nthanks";

        let (_, steps) = parse_structured(response).expect("fenced parse");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].instruction, "Check disk");
        assert_eq!(steps[0].priority, StepPriority::Medium);
    }

    #[test]
    fn prose_is_not_structured() {
        assert!(parse_structured("Just check the memory usage manually.").is_none());
        assert!(parse_structured("").is_none());
    }

    #[test]
    fn fallback_parses_numbered_lines() {
        let response = "Some preamble\n1. Check memory with free -h\n2) Restart the service\nclosing remark";

        let (_, steps) = markdown_fallback(response);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].instruction, "Check memory with free -h");
        assert_eq!(steps[1].instruction, "Restart the service");
        assert!(steps.iter().all(|s| s.priority == StepPriority::Medium));
        assert!(steps.iter().all(|s| s.commands.is_empty()));
    }

    #[test]
    fn fallback_uses_non_blank_lines_when_nothing_is_numbered() {
        let response = "Check the memory usage\n\nReview recent deployments";

        let (_, steps) = markdown_fallback(response);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].instruction, "Check the memory usage");
    }

    #[test]
    fn fallback_on_empty_response_is_a_single_diagnostic_step() {
        let (_, steps) = markdown_fallback("");
        assert_eq!(steps.len(), 1);
        assert!(steps[0].instruction.contains("raw response"));
    }

    #[test]
    fn renumber_overrides_model_ordering() {
        let mut steps = vec![plain_step("a"), plain_step("b"), plain_step("c")];
        steps[0].order = 7;
        steps[2].order = 7;

        renumber(&mut steps);

        let orders: Vec<u32> = steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }
}
