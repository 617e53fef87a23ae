use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub name: String,
    pub namespace: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered samples for one `(name, namespace)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub name: String,
    pub namespace: String,
    pub samples: Vec<MetricSample>,
}

impl MetricSeries {
    /// Group loose samples into series per `(name, namespace)`, preserving
    /// both sample order and first-appearance order of the series.
    pub fn group(samples: Vec<MetricSample>) -> Vec<MetricSeries> {
        let mut order: Vec<(String, String)> = Vec::new();
        let mut grouped: HashMap<(String, String), Vec<MetricSample>> = HashMap::new();

        for sample in samples {
            let key = (sample.name.clone(), sample.namespace.clone());
            if !grouped.contains_key(&key) {
                order.push(key.clone());
            }
            grouped.entry(key).or_default().push(sample);
        }

        order
            .into_iter()
            .filter_map(|key| {
                grouped.remove(&key).map(|samples| MetricSeries {
                    name: key.0,
                    namespace: key.1,
                    samples,
                })
            })
            .collect()
    }
}

/// One log line fetched during enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, value: f64) -> MetricSample {
        MetricSample {
            name: name.to_string(),
            namespace: "system".to_string(),
            value,
            unit: "Percent".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn group_preserves_sample_and_series_order() {
        let series = MetricSeries::group(vec![
            sample("cpu", 1.0),
            sample("mem", 2.0),
            sample("cpu", 3.0),
        ]);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "cpu");
        assert_eq!(series[0].samples.len(), 2);
        assert_eq!(series[0].samples[1].value, 3.0);
        assert_eq!(series[1].name, "mem");
    }
}
