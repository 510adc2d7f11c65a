mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub(crate) use openai::DEFAULT_BASE_URL as OPENAI_DEFAULT_BASE_URL;

use crate::config::{Config, ProviderConfig, ProviderId};
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// One analysis request, immutable once constructed. Generation parameters
/// travel with the request; the client only contributes transport identity
/// (endpoint, credentials).
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub topic: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl ProviderRequest {
    pub fn new(topic: impl Into<String>, config: &ProviderConfig) -> Self {
        Self {
            topic: topic.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Reject before any network traffic; checked ahead of credentials.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.topic.trim().is_empty() {
            return Err(ProviderError::InvalidInput(
                "topic must be a non-empty string".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Translate the request into exactly one upstream call and classify
    /// the response. The in-flight call is cancelled when `timeout` elapses.
    async fn analyze(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<String, ProviderError>;
}

/// Create one client per enabled provider, in configured order.
pub fn create_clients(config: &Config, http: &reqwest::Client) -> Vec<Arc<dyn ProviderClient>> {
    config
        .providers
        .enabled()
        .into_iter()
        .map(|(id, provider)| match id {
            ProviderId::OpenAi => {
                Arc::new(OpenAiClient::new(provider, http.clone())) as Arc<dyn ProviderClient>
            }
            ProviderId::Anthropic => Arc::new(AnthropicClient::new(provider, http.clone())),
            ProviderId::Gemini => Arc::new(GeminiClient::new(provider, http.clone())),
        })
        .collect()
}

/// Resolve an API key from its configured environment variable. Keys are
/// read once at client construction, not per request.
pub(crate) fn resolve_api_key(env_var: &str) -> Option<String> {
    std::env::var(env_var).ok().filter(|key| !key.is_empty())
}

/// Issue a JSON POST and classify the outcome.
///
/// 429 becomes `RateLimited` with the `Retry-After` header (integral
/// seconds) when present; other non-2xx become `UpstreamError` carrying the
/// status text and the error body's message field; a 2xx that is not valid
/// JSON becomes `MalformedResponse`.
pub(crate) async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<Value, ProviderError> {
    let send = async {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::UpstreamError {
                provider: provider.to_string(),
                status: 0,
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ProviderError::UpstreamError {
                provider: provider.to_string(),
                status: status.as_u16(),
                message: upstream_message(status, &body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {e}")))
    };

    // Dropping the in-flight future on expiry aborts the underlying
    // connection; the attempt is not left running past its deadline.
    match tokio::time::timeout(timeout, send).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::UpstreamTimeout(timeout)),
    }
}

/// `<status text> - <error body message>` when the body carries one, in the
/// upstream convention `{"error": {"message": ...}}`.
fn upstream_message(status: StatusCode, body: &str) -> String {
    let status_text = status.canonical_reason().unwrap_or("unknown status");
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()));

    match detail {
        Some(msg) => format!("{status_text} - {msg}"),
        None => status_text.to_string(),
    }
}
