//! Language-model integration for carvox.
//!
//! This crate exposes the [`traits::LlmClient`] interface, an OpenAI chat
//! completions implementation, and the review-summary prompt. Use
//! [`client_from_config`] to build a client from a [`carvox_config::LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use carvox_config::CarvoxConfigLoader;
//! use carvox_llm::client_from_config;
//!
//! # async fn demo() -> carvox_common::Result<()> {
//! let cfg = CarvoxConfigLoader::new().load()?;
//! let client = client_from_config(&cfg.llm, cfg.http.timeout())?;
//! let summary = client.summarize_reviews("Quiet cabin\nThirsty engine").await?;
//! for line in summary.lines() {
//!     println!("- {line}");
//! }
//! # Ok(())
//! # }
//! ```
pub mod openai;
pub mod summarize;
pub mod traits;

use carvox_common::Result;
use carvox_config::LlmConfig;
use openai::OpenAiClient;
use std::sync::Arc;
use std::time::Duration;
use traits::LlmClient;

/// Default model used when the configuration does not name one.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Build the configured client. Missing credentials fail here, before any
/// network traffic.
pub fn client_from_config(
    config: &LlmConfig,
    timeout: Option<Duration>,
) -> Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        LlmConfig::Openai {
            model, endpoint, ..
        } => {
            let api_key = config.require_api_key()?.to_string();
            let model = if model.trim().is_empty() {
                DEFAULT_OPENAI_MODEL.to_string()
            } else {
                model.clone()
            };
            let client = OpenAiClient::with_endpoint(endpoint, api_key, model, timeout)?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_an_auth_error() {
        let cfg = LlmConfig::Openai {
            model: "gpt-4o".into(),
            api_key: "${OPENAI_API_KEY}".into(),
            endpoint: "https://api.openai.com/v1".into(),
        };
        let err = client_from_config(&cfg, None).err().expect("should fail");
        assert!(err.is_auth());
    }

    #[test]
    fn blank_model_falls_back_to_default() {
        let cfg = LlmConfig::Openai {
            model: "  ".into(),
            api_key: "sk-test".into(),
            endpoint: "https://api.openai.com/v1".into(),
        };
        let client = client_from_config(&cfg, None).expect("client builds");
        assert_eq!(client.model_name(), DEFAULT_OPENAI_MODEL);
    }
}
