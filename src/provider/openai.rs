use super::{resolve_api_key, send_json, ProviderClient, ProviderRequest};
use crate::config::{ProviderConfig, ProviderId};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "You are an expert technology research analyst \
specializing in synthesizing complex technical information into clear, \
actionable insights.";

/// OpenAI Chat Completions client. Auth via `Authorization: Bearer`;
/// the generated text lives at `choices[0].message.content`.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenAiClient {
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
            "You are an expert technology research analyst. Please provide a \
             comprehensive analysis of the technology topic \"{topic}\". Cover:\n\n\
             1. Core Concepts and Capabilities\n\
             2. Implementation Approaches and Tooling\n\
             3. Strengths and Current Limitations\n\
             4. Notable Adopters and Real-World Usage\n\
             5. Practical Recommendations\n\n\
             Format your response in clear markdown with concise sections. \
             Focus on key insights and practical details."
        )
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        serde_json::json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::analysis_prompt(&request.topic) },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens,
        })
    }

    /// Chat Completions responses put the generated text at
    /// `choices[0].message.content`; the synthesis engine reuses this for
    /// its own delegated call.
    pub(crate) fn parse_content(body: &Value) -> Result<String, ProviderError> {
        match body["choices"][0]["message"]["content"].as_str() {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            Some(_) => Err(ProviderError::MalformedResponse(
                "empty message content".to_string(),
            )),
            None => Err(ProviderError::MalformedResponse(
                "missing choices[0].message.content".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
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
                provider: "OpenAI".to_string(),
                env_var: self.api_key_env.clone(),
            })?;

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = request.model.as_str(), "Sending OpenAI analysis request");

        let body = send_json(
            "OpenAI",
            self.http
                .post(&url)
                .bearer_auth(api_key)
                .json(&self.build_request_body(request)),
            timeout,
        )
        .await?;

        Self::parse_content(&body)
    }
}
