//! Chat-model client for Crucible
//!
//! Provides the completion interface the judge uses to score outputs. The
//! concrete client talks to any OpenAI-compatible endpoint; evaluators depend
//! only on the [`ChatModel`] trait so tests can substitute stubs.

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client as OpenAIClient,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A model that can answer a (system, user) prompt pair with text.
///
/// Judged evaluators hold this as a trait object; production code injects
/// [`LlmClient`], tests inject in-process stubs.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for a system prompt and user message.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Chat-model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (only "openai"-compatible endpoints are supported)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model to use for judge completions
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (optional if using env var or a local endpoint)
    pub api_key: Option<String>,
    /// Base URL override (for custom endpoints)
    pub base_url: Option<String>,
    /// Sampling temperature. Judges want deterministic scores.
    #[serde(default)]
    pub temperature: f32,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            temperature: 0.0,
        }
    }
}

/// Chat-model client over an OpenAI-compatible API
pub struct LlmClient {
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new client with the given configuration
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Build a client from the environment.
    ///
    /// Reads `OPENAI_API_KEY`, with `JUDGE_MODEL` overriding the default model
    /// and `JUDGE_BASE_URL` pointing at a custom endpoint.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        let base_url = std::env::var("JUDGE_BASE_URL").ok();

        if api_key.is_none() && base_url.is_none() {
            anyhow::bail!("OPENAI_API_KEY not set (or set JUDGE_BASE_URL for a local endpoint)");
        }

        let mut config = LlmConfig {
            api_key,
            base_url,
            ..Default::default()
        };
        if let Ok(model) = std::env::var("JUDGE_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }

        Ok(Self::new(config))
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String> {
        let mut openai_config = OpenAIConfig::new();

        if let Some(api_key) = &self.config.api_key {
            openai_config = openai_config.with_api_key(api_key);
        }

        if let Some(base_url) = &self.config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        let client = OpenAIClient::with_config(openai_config);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()
            .context("Failed to build system message")?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user)
            .build()
            .context("Failed to build user message")?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .temperature(self.config.temperature)
            .messages([system_msg.into(), user_msg.into()])
            .build()
            .context("Failed to build chat completion request")?;

        let response = client
            .chat()
            .create(request)
            .await
            .context("Failed to create chat completion")?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        match self.config.provider.as_str() {
            "openai" => self.complete_openai(system, user).await,
            provider => anyhow::bail!("Unsupported chat-model provider: {}", provider),
        }
    }
}
