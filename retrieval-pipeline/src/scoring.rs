use std::cmp::Ordering;
use std::collections::HashSet;

use regex::RegexBuilder;

use common::model::{Alert, RetrievedChunk, RunbookChunk};

/// Additive boost per matching chunk tag.
const TAG_BOOST: f32 = 0.1;
/// Upper bound for the accumulated tag boost.
const TAG_BOOST_CAP: f32 = 0.3;
/// Boost when any applicable-shape pattern matches the resource shape.
const SHAPE_BOOST: f32 = 0.2;

/// Metadata boost for one chunk against one alert, in `[0, 0.5]`.
///
/// Tags count when they intersect the alert's dimension or label values;
/// shape patterns are matched case-insensitively against the resource shape.
/// The shape filter is soft: a chunk with non-matching patterns simply earns
/// no boost, it is never dropped.
pub fn metadata_boost(chunk: &RunbookChunk, alert: &Alert, shape: Option<&str>) -> f32 {
    let alert_values: HashSet<&str> = alert
        .dimensions
        .values()
        .chain(alert.labels.values())
        .map(String::as_str)
        .collect();

    let mut tag_boost = 0.0f32;
    for tag in &chunk.tags {
        if alert_values.contains(tag.as_str()) {
            tag_boost += TAG_BOOST;
        }
    }

    let mut boost = tag_boost.min(TAG_BOOST_CAP);

    if let Some(shape) = shape {
        if chunk
            .applicable_shapes
            .iter()
            .any(|pattern| shape_pattern_matches(pattern, shape))
        {
            boost += SHAPE_BOOST;
        }
    }

    boost
}

/// Case-insensitive full match of a shape pattern.
///
/// Patterns containing `*` or `?` are interpreted as globs; anything else is
/// compiled as a regex. A pattern that fails to compile falls back to a
/// case-insensitive literal comparison.
pub fn shape_pattern_matches(pattern: &str, shape: &str) -> bool {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return false;
    }

    let source = if pattern.contains('*') || pattern.contains('?') {
        glob_to_regex(pattern)
    } else {
        pattern.to_string()
    };

    match RegexBuilder::new(&format!("^(?:{source})$"))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.is_match(shape),
        Err(_) => pattern.eq_ignore_ascii_case(shape),
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut source = String::with_capacity(glob.len() * 2);
    for ch in glob.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source
}

/// Deterministic ranking: final score descending, chunk id ascending on
/// ties.
pub fn sort_retrieved(items: &mut [RetrievedChunk]) {
    items.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use common::model::Severity;

    use super::*;

    fn alert_with_labels(labels: &[(&str, &str)]) -> Alert {
        Alert {
            id: "a-1".to_string(),
            title: "t".to_string(),
            message: "m".to_string(),
            severity: Severity::Critical,
            source_service: "test".to_string(),
            dimensions: HashMap::from([("InstanceId".to_string(), "i-1".to_string())]),
            labels: labels
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            timestamp: Utc::now(),
            raw_payload: String::new(),
        }
    }

    fn chunk_with(tags: &[&str], shapes: &[&str]) -> RunbookChunk {
        RunbookChunk {
            id: "c-1".to_string(),
            runbook_path: "runbooks/x.md".to_string(),
            section_title: "s".to_string(),
            content: "c".to_string(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            applicable_shapes: shapes.iter().map(|s| (*s).to_string()).collect(),
            embedding: vec![1.0],
        }
    }

    #[test]
    fn tag_boost_accumulates_and_caps() {
        let alert = alert_with_labels(&[
            ("kind", "memory"),
            ("service", "payments"),
            ("env", "prod"),
            ("tier", "web"),
        ]);

        let one_match = chunk_with(&["memory"], &[]);
        assert!((metadata_boost(&one_match, &alert, None) - 0.1).abs() < 1e-6);

        let four_matches = chunk_with(&["memory", "payments", "prod", "web"], &[]);
        assert!((metadata_boost(&four_matches, &alert, None) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn shape_glob_matches_case_insensitively() {
        assert!(shape_pattern_matches("VM.*", "VM.Standard.E4.Flex"));
        assert!(shape_pattern_matches("vm.*", "VM.Standard.E4.Flex"));
        assert!(!shape_pattern_matches("VM.*", "BM.Standard.3"));
        assert!(shape_pattern_matches("t?.large", "t3.large"));
    }

    #[test]
    fn shape_regex_without_glob_chars_is_supported() {
        assert!(shape_pattern_matches("t3\\.(large|xlarge)", "t3.xlarge"));
        assert!(!shape_pattern_matches("t3\\.(large|xlarge)", "t3.micro"));
    }

    #[test]
    fn shape_boost_requires_a_shape() {
        let alert = alert_with_labels(&[]);
        let chunk = chunk_with(&[], &["VM.*"]);

        assert_eq!(metadata_boost(&chunk, &alert, None), 0.0);
        assert!(
            (metadata_boost(&chunk, &alert, Some("VM.Standard.E4.Flex")) - 0.2).abs() < 1e-6
        );
    }

    #[test]
    fn non_matching_shapes_demote_but_never_drop() {
        let alert = alert_with_labels(&[("kind", "memory")]);
        let chunk = chunk_with(&["memory"], &["BM.*"]);

        // Shape misses, tag still counts.
        let boost = metadata_boost(&chunk, &alert, Some("VM.Standard.E4.Flex"));
        assert!((boost - 0.1).abs() < 1e-6);
    }

    #[test]
    fn sort_breaks_ties_on_id() {
        let mut items = vec![
            RetrievedChunk {
                chunk: RunbookChunk {
                    id: "b".to_string(),
                    ..chunk_with(&[], &[])
                },
                similarity: 0.9,
                metadata_boost: 0.0,
                final_score: 0.9,
            },
            RetrievedChunk {
                chunk: RunbookChunk {
                    id: "a".to_string(),
                    ..chunk_with(&[], &[])
                },
                similarity: 0.9,
                metadata_boost: 0.0,
                final_score: 0.9,
            },
        ];

        sort_retrieved(&mut items);

        assert_eq!(items[0].chunk.id, "a");
        assert_eq!(items[1].chunk.id, "b");
    }
}
