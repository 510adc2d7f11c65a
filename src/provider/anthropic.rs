use super::{resolve_api_key, send_json, ProviderClient, ProviderRequest};
use crate::config::{ProviderConfig, ProviderId};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Required API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages client. Auth via `x-api-key` plus the
/// `anthropic-version` header; the generated text lives at
/// `content[0].text`.
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl AnthropicClient {
    pub fn new(config: &ProviderConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: resolve_api_key(&config.api_key_env),
            api_key_env: config.api_key_env.clone(),
        }
    }

    fn analysis_prompt(topic: &str) -> String {
        format!(
            "You are an expert technology research analyst with deep expertise \
             in technical architecture, implementation, and industry trends. \
             Please provide a focused analysis of the technology topic \
             \"{topic}\". Your analysis should cover:\n\n\
             1. Technical Architecture (Core components, system design, data flow)\n\
             2. Implementation Details (Development stack, deployment, best practices)\n\
             3. Security Considerations (Security architecture, data protection, compliance)\n\
             4. Integration Patterns (API design, data exchange, error handling)\n\
             5. Industry Landscape (Market position, trends, challenges)\n\n\
             Format your response in clear markdown with concise sections. \
             Focus on key insights and practical details."
        )
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_output_tokens,
            "messages": [
                { "role": "user", "content": Self::analysis_prompt(&request.topic) },
            ],
        })
    }

    fn parse_content(body: &Value) -> Result<String, ProviderError> {
        match body["content"][0]["text"].as_str() {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            Some(_) => Err(ProviderError::MalformedResponse(
                "empty text block".to_string(),
            )),
            None => Err(ProviderError::MalformedResponse(
                "missing content[0].text".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn analyze(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        request.validate()?;

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::AuthConfigMissing {
                provider: "Claude".to_string(),
                env_var: self.api_key_env.clone(),
            })?;

        let url = format!("{}/messages", self.base_url);
        debug!(model = request.model.as_str(), "Sending Claude analysis request");

        let body = send_json(
            "Claude",
            self.http
                .post(&url)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&self.build_request_body(request)),
            timeout,
        )
        .await?;

        Self::parse_content(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_client() -> AnthropicClient {
        let mut config = Config::default().providers.anthropic;
        config.api_key_env = "ANTHROPIC_TEST_KEY_UNSET".to_string();
        AnthropicClient::new(&config, reqwest::Client::new())
    }

    #[test]
    fn test_build_request_body() {
        let client = test_client();
        let request = ProviderRequest::new("Kubernetes", &Config::default().providers.anthropic);
        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["max_tokens"], 2000);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert!(messages[0]["content"]
            .as_str()
            .unwrap()
            .contains("Kubernetes"));
    }

    #[test]
    fn test_parse_content() {
        let body = serde_json::json!({
            "content": [ { "type": "text", "text": "Deep analysis." } ],
            "model": "claude-3-sonnet-20240229"
        });
        assert_eq!(
            AnthropicClient::parse_content(&body).unwrap(),
            "Deep analysis."
        );
    }

    #[test]
    fn test_parse_content_missing_block() {
        let body = serde_json::json!({ "content": [] });
        assert!(matches!(
            AnthropicClient::parse_content(&body),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_content_empty_text() {
        let body = serde_json::json!({ "content": [ { "type": "text", "text": "" } ] });
        assert!(matches!(
            AnthropicClient::parse_content(&body),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = test_client();
        let request = ProviderRequest::new("Rust", &Config::default().providers.anthropic);
        let err = client
            .analyze(&request, Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            ProviderError::AuthConfigMissing { provider, env_var } => {
                assert_eq!(provider, "Claude");
                assert_eq!(env_var, "ANTHROPIC_TEST_KEY_UNSET");
            }
            other => panic!("Expected AuthConfigMissing, got {other:?}"),
        }
    }
}
