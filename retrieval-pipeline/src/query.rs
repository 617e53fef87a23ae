use common::model::EnrichedContext;

/// How many distinct metric names are appended to the query text.
const MAX_METRIC_NAMES: usize = 3;

/// Deterministic query string for embedding: alert title and message,
/// followed by the resource shape and the leading metric names when present.
pub fn build_query_text(ctx: &EnrichedContext) -> String {
    let mut query = format!("{} {}", ctx.alert.title, ctx.alert.message);

    if let Some(shape) = ctx.resource.as_ref().and_then(|r| r.shape.as_deref()) {
        query.push(' ');
        query.push_str(shape);
    }

    for series in ctx.metrics.iter().take(MAX_METRIC_NAMES) {
        query.push(' ');
        query.push_str(&series.name);
    }

    query
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use common::model::{Alert, MetricSeries, ResourceMetadata, Severity};

    use super::*;

    fn context() -> EnrichedContext {
        EnrichedContext::bare(Alert {
            id: "a-1".to_string(),
            title: "High Memory Usage".to_string(),
            message: "above 90 percent".to_string(),
            severity: Severity::Critical,
            source_service: "cloudwatch".to_string(),
            dimensions: HashMap::new(),
            labels: HashMap::new(),
            timestamp: Utc::now(),
            raw_payload: String::new(),
        })
    }

    #[test]
    fn bare_context_uses_title_and_message() {
        assert_eq!(
            build_query_text(&context()),
            "High Memory Usage above 90 percent"
        );
    }

    #[test]
    fn shape_and_metric_names_are_appended() {
        let mut ctx = context();
        ctx.resource = Some(ResourceMetadata {
            id: "i-1".to_string(),
            display_name: "web-1".to_string(),
            grouping: None,
            shape: Some("VM.Standard.E4.Flex".to_string()),
            zone: None,
            tags: HashMap::new(),
            structured_tags: HashMap::new(),
        });
        ctx.metrics = vec![MetricSeries {
            name: "MemoryUtilization".to_string(),
            namespace: "system".to_string(),
            samples: Vec::new(),
        }];

        let query = build_query_text(&ctx);
        assert!(query.starts_with("High Memory Usage above 90 percent"));
        assert!(query.contains("VM.Standard.E4.Flex"));
        assert!(query.ends_with("MemoryUtilization"));
    }
}
