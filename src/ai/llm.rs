//! LLM client for OpenAI-compatible chat completion APIs (OpenRouter by default)

use anyhow::{Result, Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{prompts, PerformanceMetrics, RecentTopic, Tutor};
use crate::config::LlmConfig;
use crate::store::Learner;
use crate::types::Subject;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Configuration for an LLM API provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL for the API (e.g., "https://openrouter.ai/api/v1")
    pub base_url: String,
    /// API key for authentication; requests fail when absent
    pub api_key: Option<String>,
    /// Extra headers to include in requests (e.g., X-Title, HTTP-Referer)
    pub extra_headers: Vec<(String, String)>,
}

impl ProviderConfig {
    /// Create an OpenRouter provider configuration
    pub fn openrouter(api_key: Option<String>) -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key,
            extra_headers: vec![
                ("X-Title".to_string(), "EduSmart".to_string()),
            ],
        }
    }
}

/// Token budgets per call type
#[derive(Debug, Clone, Copy)]
pub struct TokenBudgets {
    pub answer: u32,
    pub recommendation: u32,
    pub analysis: u32,
}

impl Default for TokenBudgets {
    fn default() -> Self {
        Self {
            answer: 1024,
            recommendation: 1500,
            analysis: 800,
        }
    }
}

/// LLM API client
#[derive(Clone)]
pub struct LlmClient {
    client: Arc<Client>,
    provider: ProviderConfig,
    model: String,
    budgets: TokenBudgets,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

impl LlmClient {
    /// Create a client with a specific provider configuration
    pub fn with_provider(config: ProviderConfig, model: impl Into<String>) -> Self {
        Self {
            client: Arc::new(Client::new()),
            provider: config,
            model: model.into(),
            budgets: TokenBudgets::default(),
        }
    }

    /// Create client from config. The API key comes from the config
    /// (environment) first, then the keyring.
    pub fn from_config(config: &LlmConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| super::keyring::get_api_key().ok());

        if api_key.is_none() {
            tracing::warn!("No LLM API key configured; answers and recommendations will fail");
        }

        let provider = ProviderConfig {
            base_url: config.base_url.clone(),
            ..ProviderConfig::openrouter(api_key)
        };

        Self {
            client: Arc::new(Client::new()),
            provider,
            model: config.model.clone(),
            budgets: TokenBudgets {
                answer: config.answer_max_tokens,
                recommendation: config.recommendation_max_tokens,
                analysis: config.analysis_max_tokens,
            },
        }
    }

    /// Send a chat completion request and return the text of the first choice
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let Some(api_key) = &self.provider.api_key else {
            bail!("LLM API key not configured");
        };

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
        };

        let mut req_builder = self.client
            .post(format!("{}/chat/completions", self.provider.base_url))
            .header("Authorization", format!("Bearer {}", api_key));
        for (key, value) in &self.provider.extra_headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }
        let response = req_builder
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LLM provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("LLM API error ({}): {}", status, body);
        }

        let body = response.text().await.context("Failed to read response body")?;
        debug!("LLM response: {} bytes", body.len());

        let raw_response: serde_json::Value = serde_json::from_str(&body)
            .context("Failed to parse JSON response")?;

        extract_content(&raw_response)
    }
}

/// Pull the text out of a chat completion response. Content may be a plain
/// string or an array of content parts.
fn extract_content(response: &serde_json::Value) -> Result<String> {
    let content_value = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    let content = match content_value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(parts)) => {
            parts.iter().filter_map(|part| {
                if part.get("type").and_then(|t| t.as_str()) == Some("text") {
                    part.get("text").and_then(|t| t.as_str()).map(|s| s.to_string())
                } else {
                    None
                }
            }).collect::<Vec<_>>().join("")
        }
        _ => bail!("Unexpected response shape from LLM provider"),
    };

    Ok(content)
}

#[async_trait]
impl Tutor for LlmClient {
    async fn answer(&self, subject: Subject, topic: &str, question: &str) -> Result<String> {
        let messages = vec![
            ChatMessage::system(prompts::tutor_system_prompt(subject, topic)),
            ChatMessage::user(question),
        ];
        self.complete(messages, Some(self.budgets.answer))
            .await
            .context("Failed to get AI response")
    }

    async fn recommend(&self, learner: &Learner, recent: &[RecentTopic]) -> Result<String> {
        let messages = vec![
            ChatMessage::system(prompts::ADVISOR_SYSTEM_PROMPT),
            ChatMessage::user(prompts::recommendation_prompt(learner, recent)),
        ];
        self.complete(messages, Some(self.budgets.recommendation))
            .await
            .context("Failed to generate recommendations")
    }

    async fn analyze(&self, metrics: &PerformanceMetrics) -> Result<String> {
        let messages = vec![
            ChatMessage::system(prompts::ANALYST_SYSTEM_PROMPT),
            ChatMessage::user(prompts::analysis_prompt(metrics)),
        ];
        self.complete(messages, Some(self.budgets.analysis))
            .await
            .context("Failed to analyze performance")
    }
}
