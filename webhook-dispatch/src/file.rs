use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::info;

use common::error::AppError;
use common::model::{Alert, Checklist, DeliveryResult};

use crate::destination::Destination;

const FILE_DESTINATION_NAME: &str = "file";

/// Built-in destination writing each checklist to
/// `<output_dir>/checklist-<alert_id>-<unix_millis>.json`. The file name
/// schema is part of the contract.
pub struct FileDestination {
    output_dir: PathBuf,
    enabled: bool,
}

impl FileDestination {
    pub fn new(output_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            enabled,
        }
    }

    async fn write(&self, checklist: &Checklist) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let file_name = format!(
            "checklist-{}-{}.json",
            checklist.alert_id,
            Utc::now().timestamp_millis()
        );
        let path = self.output_dir.join(file_name);

        let body = serde_json::to_vec_pretty(checklist)?;
        tokio::fs::write(&path, body).await?;

        Ok(path)
    }
}

#[async_trait]
impl Destination for FileDestination {
    fn name(&self) -> &str {
        FILE_DESTINATION_NAME
    }

    fn destination_type(&self) -> &str {
        "file"
    }

    async fn send(&self, checklist: &Checklist) -> Result<DeliveryResult, AppError> {
        match self.write(checklist).await {
            Ok(path) => {
                info!(path = %path.display(), "Checklist written");
                Ok(DeliveryResult::success(
                    FILE_DESTINATION_NAME,
                    "file",
                    None,
                ))
            }
            Err(err) => Ok(DeliveryResult::failure(
                FILE_DESTINATION_NAME,
                "file",
                None,
                format!("Write failed: {err}"),
            )),
        }
    }

    /// The file destination has no filter of its own; it receives
    /// everything while enabled.
    fn should_send(&self, _checklist: &Checklist, _alert: &Alert) -> bool {
        self.enabled
    }

    fn config(&self) -> serde_json::Value {
        json!({
            "name": FILE_DESTINATION_NAME,
            "type": "file",
            "outputDirectory": self.output_dir.display().to_string(),
            "enabled": self.enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use common::model::{Alert, Severity};

    use super::*;

    fn checklist() -> Checklist {
        Checklist {
            alert_id: "cw-abc".to_string(),
            summary: "s".to_string(),
            steps: Vec::new(),
            source_runbooks: Vec::new(),
            generated_at: Utc::now(),
            llm_provider_used: "test".to_string(),
        }
    }

    fn alert() -> Alert {
        Alert {
            id: "cw-abc".to_string(),
            title: "t".to_string(),
            message: "m".to_string(),
            severity: Severity::Critical,
            source_service: "test".to_string(),
            dimensions: HashMap::new(),
            labels: HashMap::new(),
            timestamp: Utc::now(),
            raw_payload: String::new(),
        }
    }

    #[tokio::test]
    async fn writes_checklist_json_with_contract_file_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let destination = FileDestination::new(dir.path().join("out"), true);

        let result = destination.send(&checklist()).await.expect("send");
        assert!(result.success);

        let mut entries = tokio::fs::read_dir(dir.path().join("out"))
            .await
            .expect("read dir");
        let entry = entries
            .next_entry()
            .await
            .expect("next entry")
            .expect("one file");
        let name = entry.file_name().to_string_lossy().into_owned();
        assert!(name.starts_with("checklist-cw-abc-"));
        assert!(name.ends_with(".json"));

        let written = tokio::fs::read(entry.path()).await.expect("read file");
        let parsed: Checklist = serde_json::from_slice(&written).expect("parse written file");
        assert_eq!(parsed.alert_id, "cw-abc");
    }

    #[tokio::test]
    async fn disabled_file_destination_declines_everything() {
        let destination = FileDestination::new("/tmp/unused", false);
        assert!(!destination.should_send(&checklist(), &alert()));

        let enabled = FileDestination::new("/tmp/unused", true);
        assert!(enabled.should_send(&checklist(), &alert()));
    }

    #[tokio::test]
    async fn unwritable_directory_reports_failure_not_error() {
        let destination = FileDestination::new("/proc/definitely/not/writable", true);

        let result = destination.send(&checklist()).await.expect("send");
        assert!(!result.success);
        assert!(result.error.is_some());
        assert!(result.status_code.is_none());
    }
}
