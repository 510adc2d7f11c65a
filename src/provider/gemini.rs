use super::{resolve_api_key, send_json, ProviderClient, ProviderRequest};
use crate::config::{ProviderConfig, ProviderId};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

/// Gemini generateContent client. Auth via a `key` query parameter; the
/// generated text lives at `candidates[0].content.parts[0].text`.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl GeminiClient {
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
            "You are an expert technology research analyst specializing in \
             market trends and emerging technologies. Please provide a \
             detailed analysis of the technology topic \"{topic}\". Include \
             information about:\n\n\
             1. Market Landscape and Industry Trends\n\
             2. Key Players and Competitive Analysis\n\
             3. Investment Activity and Growth Metrics\n\
             4. Adoption Patterns and Use Cases\n\
             5. Future Market Projections\n\n\
             Format your response in clear, well-structured paragraphs with \
             appropriate markdown formatting."
        )
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        serde_json::json!({
            "contents": [
                { "parts": [ { "text": Self::analysis_prompt(&request.topic) } ] }
            ],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens,
                "topP": 0.8,
                "topK": 40,
            },
        })
    }

    fn parse_content(body: &Value) -> Result<String, ProviderError> {
        match body["candidates"][0]["content"]["parts"][0]["text"].as_str() {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            Some(_) => Err(ProviderError::MalformedResponse(
                "empty candidate part".to_string(),
            )),
            None => Err(ProviderError::MalformedResponse(
                "missing candidates[0].content.parts[0].text".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
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
                provider: "Gemini".to_string(),
                env_var: self.api_key_env.clone(),
            })?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, request.model
        );
        debug!(model = request.model.as_str(), "Sending Gemini analysis request");

        let body = send_json(
            "Gemini",
            self.http
                .post(&url)
                .query(&[("key", api_key)])
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

    fn test_client() -> GeminiClient {
        let mut config = Config::default().providers.gemini;
        config.api_key_env = "GEMINI_TEST_KEY_UNSET".to_string();
        GeminiClient::new(&config, reqwest::Client::new())
    }

    #[test]
    fn test_build_request_body() {
        let client = test_client();
        let request = ProviderRequest::new("Edge computing", &Config::default().providers.gemini);
        let body = client.build_request_body(&request);

        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("Edge computing"));

        let generation = &body["generationConfig"];
        assert_eq!(generation["temperature"], 0.7);
        assert_eq!(generation["maxOutputTokens"], 2000);
        assert_eq!(generation["topP"], 0.8);
        assert_eq!(generation["topK"], 40);
    }

    #[test]
    fn test_parse_content() {
        let body = serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Market view." } ] } }
            ]
        });
        assert_eq!(GeminiClient::parse_content(&body).unwrap(), "Market view.");
    }

    #[test]
    fn test_parse_content_no_candidates() {
        let body = serde_json::json!({ "candidates": [] });
        assert!(matches!(
            GeminiClient::parse_content(&body),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = test_client();
        let request = ProviderRequest::new("Rust", &Config::default().providers.gemini);
        let err = client
            .analyze(&request, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AuthConfigMissing { .. }));
    }
}
