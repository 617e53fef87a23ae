use serde::{Deserialize, Serialize};

/// Outcome of delivering one checklist to one destination, after retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub destination: String,
    pub destination_type: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Number of attempts actually made (1 = no retries needed).
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn success(destination: &str, destination_type: &str, status: Option<u16>) -> Self {
        Self {
            destination: destination.to_string(),
            destination_type: destination_type.to_string(),
            success: true,
            status_code: status,
            attempts: 1,
            error: None,
        }
    }

    pub fn failure(
        destination: &str,
        destination_type: &str,
        status: Option<u16>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.to_string(),
            destination_type: destination_type.to_string(),
            success: false,
            status_code: status,
            attempts: 1,
            error: Some(error.into()),
        }
    }
}
