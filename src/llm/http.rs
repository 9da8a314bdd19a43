//! HTTP reasoning-model client
//!
//! Speaks either the Anthropic Messages API or the OpenAI chat-completions
//! API, wrapped in bounded retry for transient statuses.

use super::retry::{retry_after, with_retry, AttemptOutcome, RetryConfig};
use super::ReasoningModel;
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Wire protocol of the model endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    #[default]
    Anthropic,
    /// OpenAI or any OpenAI-compatible server
    Openai,
}

impl ModelProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::Openai => "https://api.openai.com",
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            Self::Anthropic => "/v1/messages",
            Self::Openai => "/v1/chat/completions",
        }
    }
}

/// Reasoning model reached over HTTP
pub struct HttpReasoningModel {
    client: reqwest::Client,
    provider: ModelProvider,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    retry: RetryConfig,
}

impl HttpReasoningModel {
    pub fn new(
        provider: ModelProvider,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            max_tokens: 2048,
            retry: RetryConfig::default(),
        }
    }

    /// Build from configuration, resolving the API key from the environment.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .or_else(|_| std::env::var(config.api_key_env.to_uppercase()))
            .ok();
        if api_key.is_none() && config.provider == ModelProvider::Anthropic {
            return Err(Error::Config(format!(
                "API key environment variable '{}' is not set",
                config.api_key_env
            )));
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| config.provider.default_base_url().to_string());

        Ok(Self::new(config.provider, base_url, config.model.clone(), api_key)
            .with_max_tokens(config.max_tokens)
            .with_retry(config.retry.clone()))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        })
    }

    fn request(&self, url: &str, body: &serde_json::Value) -> reqwest::RequestBuilder {
        let builder = self.client.post(url).json(body);
        match (self.provider, self.api_key.as_deref()) {
            (ModelProvider::Anthropic, key) => builder
                .header("x-api-key", key.unwrap_or_default())
                .header("anthropic-version", ANTHROPIC_VERSION),
            (ModelProvider::Openai, Some(key)) => builder.bearer_auth(key),
            (ModelProvider::Openai, None) => builder,
        }
    }

    fn extract_text(&self, body: &str) -> Result<String> {
        match self.provider {
            ModelProvider::Anthropic => {
                let parsed: AnthropicResponse = serde_json::from_str(body)?;
                Ok(parsed
                    .content
                    .into_iter()
                    .filter(|block| block.block_type == "text")
                    .filter_map(|block| block.text)
                    .collect::<Vec<_>>()
                    .join(""))
            }
            ModelProvider::Openai => {
                let parsed: OpenAiResponse = serde_json::from_str(body)?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| Error::Model("response contained no choices".to_string()))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ReasoningModel for HttpReasoningModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, self.provider.endpoint());
        let body = self.build_request(prompt);

        let text = with_retry(&self.retry, |_attempt| {
            let url = &url;
            let body = &body;
            async move {
                let resp = match self.request(url, body).send().await {
                    Ok(resp) => resp,
                    Err(e) => return AttemptOutcome::Fatal(Error::Http(e)),
                };
                let status = resp.status();
                let hint = retry_after(resp.headers());
                let text = resp.text().await.unwrap_or_default();
                if status.is_success() {
                    AttemptOutcome::Success(text)
                } else if self.retry.is_retryable_status(status) {
                    AttemptOutcome::Retryable {
                        status,
                        body: text,
                        retry_after: hint,
                    }
                } else {
                    AttemptOutcome::Fatal(Error::Model(format!(
                        "{:?} API error at {} ({}): {}",
                        self.provider, url, status, text
                    )))
                }
            }
        })
        .await?;

        self.extract_text(&text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn no_wait_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_anthropic_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "text", "text": "{\"violations\": [], "},
                    {"type": "text", "text": "\"confidence\": 0.9}"}
                ]
            })))
            .mount(&server)
            .await;

        let model = HttpReasoningModel::new(
            ModelProvider::Anthropic,
            server.uri(),
            "claude-test",
            Some("test-key".to_string()),
        );
        let text = model.complete("analyze").await.unwrap();
        assert_eq!(text, "{\"violations\": [], \"confidence\": 0.9}");
    }

    #[tokio::test]
    async fn test_openai_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "rewritten"}}]
            })))
            .mount(&server)
            .await;

        let model = HttpReasoningModel::new(
            ModelProvider::Openai,
            format!("{}/", server.uri()),
            "gpt-test",
            Some("sk-test".to_string()),
        );
        assert_eq!(model.complete("rewrite").await.unwrap(), "rewritten");
    }

    #[tokio::test]
    async fn test_retries_transient_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "ok"}]
            })))
            .with_priority(2)
            .mount(&server)
            .await;

        let model = HttpReasoningModel::new(
            ModelProvider::Anthropic,
            server.uri(),
            "claude-test",
            Some("k".to_string()),
        )
        .with_retry(no_wait_retry());
        assert_eq!(model.complete("p").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_honours_short_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "0")
                    .set_body_string("rate limited"),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "after wait"}]
            })))
            .with_priority(2)
            .mount(&server)
            .await;

        let model = HttpReasoningModel::new(
            ModelProvider::Anthropic,
            server.uri(),
            "claude-test",
            Some("k".to_string()),
        )
        .with_retry(no_wait_retry());
        assert_eq!(model.complete("p").await.unwrap(), "after wait");
    }

    #[tokio::test]
    async fn test_retry_after_beyond_budget_fails_fast() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "120")
                    .set_body_string("quota exceeded"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let model = HttpReasoningModel::new(
            ModelProvider::Anthropic,
            server.uri(),
            "claude-test",
            Some("k".to_string()),
        )
        .with_retry(no_wait_retry());
        let err = model.complete("p").await.unwrap_err();
        assert!(matches!(err, Error::Model(ref m) if m.contains("budget") && m.contains("quota exceeded")));
    }

    #[tokio::test]
    async fn test_auth_failure_is_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let model = HttpReasoningModel::new(
            ModelProvider::Anthropic,
            server.uri(),
            "claude-test",
            Some("bad".to_string()),
        )
        .with_retry(no_wait_retry());
        let err = model.complete("p").await.unwrap_err();
        assert!(matches!(err, Error::Model(ref m) if m.contains("invalid key")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let model = HttpReasoningModel::new(ModelProvider::Openai, server.uri(), "m", None);
        assert!(model.complete("p").await.is_err());
    }

    #[test]
    fn test_from_config_requires_anthropic_key() {
        let config = ModelConfig {
            api_key_env: "LEXGUARD_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpReasoningModel::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_config_openai_without_key() {
        let config = ModelConfig {
            provider: ModelProvider::Openai,
            api_key_env: "LEXGUARD_TEST_UNSET_KEY_VAR".to_string(),
            base_url: Some("http://localhost:8080/".to_string()),
            ..Default::default()
        };
        let model = HttpReasoningModel::from_config(&config).unwrap();
        assert_eq!(model.base_url, "http://localhost:8080");
    }
}
