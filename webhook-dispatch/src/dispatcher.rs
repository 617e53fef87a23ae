use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use common::model::{Alert, Checklist, DeliveryResult};

use crate::destination::Destination;

/// Fans a checklist out to every admitted destination in parallel, retrying
/// each with its own exponential backoff schedule.
///
/// A failure in one destination never prevents attempts on another;
/// `dispatch` itself always completes with one result per admitted
/// destination.
pub struct Dispatcher {
    destinations: RwLock<Vec<Arc<dyn Destination>>>,
}

impl Dispatcher {
    pub fn new(destinations: Vec<Arc<dyn Destination>>) -> Self {
        Self {
            destinations: RwLock::new(destinations),
        }
    }

    /// Register an additional destination at runtime.
    pub async fn register(&self, destination: Arc<dyn Destination>) {
        self.destinations.write().await.push(destination);
    }

    /// Redacted configuration of every registered destination.
    pub async fn destination_configs(&self) -> Vec<serde_json::Value> {
        self.destinations
            .read()
            .await
            .iter()
            .map(|d| d.config())
            .collect()
    }

    #[instrument(skip_all, fields(alert_id = %checklist.alert_id))]
    pub async fn dispatch(&self, checklist: &Checklist, alert: &Alert) -> Vec<DeliveryResult> {
        let admitted: Vec<Arc<dyn Destination>> = self
            .destinations
            .read()
            .await
            .iter()
            .filter(|d| d.should_send(checklist, alert))
            .map(Arc::clone)
            .collect();

        debug!(admitted = admitted.len(), "Dispatching checklist");

        let results = join_all(
            admitted
                .into_iter()
                .map(|destination| async move { send_with_retry(&*destination, checklist).await }),
        )
        .await;

        for result in &results {
            if !result.success {
                warn!(
                    destination = %result.destination,
                    attempts = result.attempts,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "Delivery failed after retries"
                );
            }
        }

        results
    }
}

/// Drive one destination to success or retry exhaustion.
///
/// Retryable failures are server errors (status 500..=599) and transport
/// failures without a status; anything else is terminal. The delay doubles
/// after every failed attempt, starting from the destination's configured
/// initial delay.
pub(crate) async fn send_with_retry(
    destination: &dyn Destination,
    checklist: &Checklist,
) -> DeliveryResult {
    let policy = destination.retry_policy();
    let mut delay = policy.initial_delay;
    let max_attempts = policy.max_attempts.max(1);

    let mut last_result = None;

    for attempt in 1..=max_attempts {
        let mut result = match destination.send(checklist).await {
            Ok(result) => result,
            Err(err) => DeliveryResult::failure(
                destination.name(),
                destination.destination_type(),
                None,
                format!("Destination error: {err}"),
            ),
        };
        result.attempts = attempt;

        if result.success || !is_retryable(&result) {
            return result;
        }

        last_result = Some(result);

        if attempt < max_attempts {
            sleep(delay).await;
            delay *= 2;
        }
    }

    // Retries exhausted: the last failure is returned verbatim.
    last_result.unwrap_or_else(|| {
        DeliveryResult::failure(
            destination.name(),
            destination.destination_type(),
            None,
            "No delivery attempt was made",
        )
    })
}

fn is_retryable(result: &DeliveryResult) -> bool {
    if result.success {
        return false;
    }
    match result.status_code {
        Some(status) => (500..=599).contains(&status),
        None => true,
    }
}
