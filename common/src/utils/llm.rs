use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::AppError;

/// Temperature used for checklist generation. Low, because the output must
/// stay close to the retrieved runbook content.
const GENERATION_TEMPERATURE: f32 = 0.2;
const GENERATION_MAX_TOKENS: u32 = 2048;

/// A text-generation model behind an identified provider.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError>;

    fn provider_id(&self) -> String;
}

/// Chat completion against an OpenAI-compatible endpoint (OpenAI, Ollama).
pub struct OpenAiTextModel {
    client: Arc<async_openai::Client<OpenAIConfig>>,
    model: String,
    provider_label: String,
}

impl OpenAiTextModel {
    pub fn new(
        client: Arc<async_openai::Client<OpenAIConfig>>,
        model: impl Into<String>,
        provider_label: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            provider_label: provider_label.into(),
        }
    }
}

#[async_trait]
impl TextModel for OpenAiTextModel {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(GENERATION_TEMPERATURE)
            .max_tokens(GENERATION_MAX_TOKENS)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Provider("LLM returned no choices".into()))?;

        debug!(chars = content.len(), model = %self.model, "LLM response received");

        Ok(content)
    }

    fn provider_id(&self) -> String {
        self.provider_label.clone()
    }
}
