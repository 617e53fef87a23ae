use std::fmt::Write;

use common::model::{EnrichedContext, RetrievedChunk};

/// Rendered for any placeholder the context cannot fill.
const UNKNOWN: &str = "unknown";

/// System prompt declaring the structure of the user message. The three
/// section headers are load-bearing: prompt assembly and tests rely on them.
pub const SYSTEM_PROMPT: &str = "\
You are an experienced site reliability engineer generating troubleshooting \
checklists for infrastructure alerts.

The user message contains three sections:
- ALERT CONTEXT: the alert and what is known about the affected resource.
- RUNBOOK SECTIONS: excerpts from operator runbooks, most relevant first.
- INSTRUCTIONS: the required output format.

Ground every step in the runbook sections. Prefer concrete, copy-pastable \
commands. Order steps so the most diagnostic checks come first. Respond with \
strict JSON only, no prose around it.";

/// Assemble the user prompt from the enriched context and the ranked chunks.
///
/// `ALERT CONTEXT` carries five placeholders in fixed order (title,
/// severity, message, resource display name, resource shape); absent values
/// render as the literal `unknown`. `RUNBOOK SECTIONS` renders chunks in
/// final-score order.
pub fn build_user_prompt(ctx: &EnrichedContext, chunks: &[RetrievedChunk]) -> String {
    let mut prompt = String::new();

    let display_name = ctx
        .resource
        .as_ref()
        .map(|r| r.display_name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN);
    let shape = ctx
        .resource
        .as_ref()
        .and_then(|r| r.shape.as_deref())
        .unwrap_or(UNKNOWN);

    prompt.push_str("ALERT CONTEXT\n");
    let _ = writeln!(prompt, "Title: {}", ctx.alert.title);
    let _ = writeln!(prompt, "Severity: {}", ctx.alert.severity);
    let _ = writeln!(prompt, "Message: {}", ctx.alert.message);
    let _ = writeln!(prompt, "Resource: {display_name}");
    let _ = writeln!(prompt, "Shape: {shape}");

    prompt.push_str("\nRUNBOOK SECTIONS\n");
    if chunks.is_empty() {
        prompt.push_str("(no matching runbook sections were found)\n");
    }
    for retrieved in chunks {
        let chunk = &retrieved.chunk;
        let _ = writeln!(
            prompt,
            "--- Runbook: {} | Section: {} ---",
            chunk.runbook_path, chunk.section_title
        );
        prompt.push_str(&chunk.content);
        prompt.push('\n');
    }

    prompt.push_str(
        "\nINSTRUCTIONS\n\
        Respond with strict JSON matching this schema:\n\
        {\n\
        \x20 \"summary\": string,\n\
        \x20 \"steps\": [\n\
        \x20   {\n\
        \x20     \"order\": integer starting at 1,\n\
        \x20     \"instruction\": string,\n\
        \x20     \"rationale\": string (optional),\n\
        \x20     \"currentValue\": string (optional),\n\
        \x20     \"expectedValue\": string (optional),\n\
        \x20     \"priority\": \"HIGH\" | \"MEDIUM\" | \"LOW\",\n\
        \x20     \"commands\": [string]\n\
        \x20   }\n\
        \x20 ]\n\
        }\n",
    );

    prompt
}
