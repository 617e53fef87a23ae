use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::model::Severity;

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Local,
    Memory,
}

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    #[default]
    Local,
    Aws,
    Oci,
}

#[derive(Clone, Deserialize, Debug, Default)]
pub struct CloudConfig {
    #[serde(default)]
    pub provider: CloudProvider,
    #[serde(default)]
    pub region: Option<String>,
    /// Runbook source bucket/container. For the local provider this is a
    /// prefix inside `data_dir`.
    #[serde(default)]
    pub bucket: Option<String>,
}

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    #[default]
    Local,
    Surreal,
}

#[derive(Clone, Deserialize, Debug)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub provider: VectorStoreProvider,
    #[serde(default = "default_surreal_address")]
    pub address: String,
    #[serde(default = "default_surreal_credential")]
    pub username: String,
    #[serde(default = "default_surreal_credential")]
    pub password: String,
    #[serde(default = "default_surreal_namespace")]
    pub namespace: String,
    #[serde(default = "default_surreal_database")]
    pub database: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::default(),
            address: default_surreal_address(),
            username: default_surreal_credential(),
            password: default_surreal_credential(),
            namespace: default_surreal_namespace(),
            database: default_surreal_database(),
        }
    }
}

fn default_surreal_address() -> String {
    "ws://localhost:8000".to_string()
}

fn default_surreal_credential() -> String {
    "root".to_string()
}

fn default_surreal_namespace() -> String {
    "ops".to_string()
}

fn default_surreal_database() -> String {
    "checklists".to_string()
}

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Ollama,
    Openai,
}

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible embeddings endpoint.
    #[default]
    Api,
    /// Deterministic hashed embeddings, no network required.
    Hashed,
}

#[derive(Clone, Deserialize, Debug)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    /// OpenAI-compatible endpoint. Defaults to a local Ollama instance.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_api_key")]
    pub api_key: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default)]
    pub embedding_backend: EmbeddingBackend,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: default_llm_base_url(),
            api_key: default_llm_api_key(),
            text_model: default_text_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            embedding_backend: EmbeddingBackend::default(),
        }
    }
}

impl LlmConfig {
    pub fn provider_label(&self) -> &'static str {
        match self.provider {
            LlmProvider::Ollama => "ollama",
            LlmProvider::Openai => "openai",
        }
    }
}

fn default_llm_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_llm_api_key() -> String {
    // Ollama accepts any key; a placeholder keeps the client builder happy.
    "ollama".to_string()
}

fn default_text_model() -> String {
    "llama3.1".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_dimensions() -> u32 {
    768
}

#[derive(Clone, Deserialize, Debug)]
pub struct FileOutputConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_output_directory")]
    pub output_directory: String,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_directory: default_output_directory(),
        }
    }
}

fn default_output_directory() -> String {
    "./checklists".to_string()
}

#[derive(Clone, Deserialize, Debug, Default)]
pub struct WebhookFilterConfig {
    /// Empty admits every severity.
    #[serde(default)]
    pub severities: Vec<Severity>,
    /// Labels that must be present with equal values on the alert.
    #[serde(default)]
    pub required_labels: HashMap<String, String>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct WebhookConfig {
    pub name: String,
    #[serde(rename = "type", default = "default_webhook_type")]
    pub webhook_type: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub filter: WebhookFilterConfig,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_webhook_type() -> String {
    "webhook".to_string()
}

fn default_true() -> bool {
    true
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

#[derive(Clone, Deserialize, Debug, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub file: FileOutputConfig,
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct RunbooksConfig {
    /// Prefix within the runbook bucket that holds `.md` documents.
    #[serde(default = "default_runbook_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub ingest_on_startup: bool,
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for RunbooksConfig {
    fn default() -> Self {
        Self {
            prefix: default_runbook_prefix(),
            ingest_on_startup: false,
            min_chunk_chars: default_min_chunk_chars(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

fn default_runbook_prefix() -> String {
    "runbooks".to_string()
}

fn default_min_chunk_chars() -> usize {
    200
}

fn default_max_chunk_chars() -> usize {
    2000
}

#[derive(Clone, Deserialize, Debug)]
pub struct EnrichmentConfig {
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: default_lookback_minutes(),
        }
    }
}

fn default_lookback_minutes() -> u64 {
    15
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub storage: StorageKind,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runbooks: RunbooksConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            storage: StorageKind::default(),
            request_timeout_secs: default_request_timeout_secs(),
            cloud: CloudConfig::default(),
            vector_store: VectorStoreConfig::default(),
            llm: LlmConfig::default(),
            output: OutputConfig::default(),
            runbooks: RunbooksConfig::default(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_config_applies_defaults() {
        let raw = serde_json::json!({
            "name": "ops-channel",
            "url": "https://hooks.example.com/ops"
        });

        let webhook: WebhookConfig = serde_json::from_value(raw).expect("deserialize webhook");
        assert!(webhook.enabled);
        assert_eq!(webhook.webhook_type, "webhook");
        assert_eq!(webhook.retry_count, 3);
        assert_eq!(webhook.retry_delay_ms, 1000);
        assert!(webhook.filter.severities.is_empty());
    }

    #[test]
    fn default_config_is_local_everything() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.cloud.provider, CloudProvider::Local);
        assert_eq!(cfg.vector_store.provider, VectorStoreProvider::Local);
        assert_eq!(cfg.llm.provider, LlmProvider::Ollama);
        assert_eq!(cfg.enrichment.lookback_minutes, 15);
        assert_eq!(cfg.runbooks.prefix, "runbooks");
    }

    #[test]
    fn unknown_provider_names_are_rejected() {
        let raw = serde_json::json!({ "provider": "azure" });
        assert!(serde_json::from_value::<CloudConfig>(raw).is_err());
    }
}
