use async_trait::async_trait;
use carvox_common::{Result, Summary};
use serde::{Deserialize, Serialize};

use crate::summarize::build_summary_prompt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Summarize the newline-joined review text into non-blank lines.
    ///
    /// Sends exactly one user message; an empty `combined_text` is still sent.
    async fn summarize_reviews(&self, combined_text: &str) -> Result<Summary> {
        let prompt = build_summary_prompt(combined_text);
        tracing::debug!(
            model = self.model_name(),
            prompt_chars = prompt.len(),
            "requesting review summary"
        );

        let response = self.generate(&prompt, None, None, None).await?;
        let summary = Summary::from_text(&response.text);

        tracing::info!(
            model = response.model.as_deref().unwrap_or(self.model_name()),
            tokens_used = ?response.tokens_used,
            lines = summary.len(),
            "review summary received"
        );
        Ok(summary)
    }
}
