mod assemble;

pub use assemble::assemble_report;

use crate::config::{Config, ProviderId, SynthesisConfig, SynthesisMode};
use crate::error::{ProviderError, SynthesisError};
use crate::provider::{send_json, OpenAiClient, OPENAI_DEFAULT_BASE_URL};
use crate::runner::{invoke_with_retry, RetryPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub const DISCLAIMER: &str = "This report was generated using advanced AI models \
and represents the latest insights in technology research.";

const SYSTEM_PROMPT: &str = "You are an expert technology research analyst \
specializing in synthesizing complex technical information into clear, \
actionable insights.";

/// The final artifact of one research run. Created once at the end of the
/// run and handed to the caller; the core retains nothing.
#[derive(Debug, Clone)]
pub struct Report {
    pub topic: String,
    pub body: String,
    pub generated_at: DateTime<Utc>,
    pub disclaimer: &'static str,
}

impl Report {
    pub fn new(topic: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            body: body.into(),
            generated_at: Utc::now(),
            disclaimer: DISCLAIMER,
        }
    }
}

/// Produces one unified report from the successful analyses.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        topic: &str,
        input: Vec<(ProviderId, String)>,
    ) -> Result<Report, SynthesisError>;
}

/// Default synthesizer: delegate to an LLM call behind its own retry
/// schedule, or assemble deterministically when no synthesis call is
/// configured (or as the configured fallback after delegation fails).
pub struct SynthesisEngine {
    http: reqwest::Client,
    config: SynthesisConfig,
    policy: RetryPolicy,
    base_url: String,
    api_key: Option<String>,
}

impl SynthesisEngine {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        let synthesis = config.synthesis.clone();
        Self {
            http,
            policy: RetryPolicy::for_synthesis(&config.retry, &synthesis),
            base_url: synthesis
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_BASE_URL.to_string()),
            api_key: std::env::var(&synthesis.api_key_env)
                .ok()
                .filter(|key| !key.is_empty()),
            config: synthesis,
        }
    }

    fn synthesis_prompt(topic: &str, input: &[(ProviderId, String)]) -> String {
        let mut prompt = format!(
            "Synthesize these analyses of \"{topic}\" into a concise, \
             well-structured report. Focus on key insights and eliminate \
             redundancy.\n\n\
             # Research Report: {topic}\n\n\
             ## Executive Summary\n[Key findings and recommendations]\n\n\
             ## Technology Overview\n[What the technology is and the problem it solves]\n\n\
             ## Technical Analysis\n[Core architecture, implementation details, and performance considerations]\n\n\
             ## Market Analysis\n[Market trends, adoption, competition]\n\n\
             ## Security and Compliance\n[Security features, data protection, regulatory posture]\n\n\
             ## Integration and Implementation\n[API design, data exchange, integration patterns]\n\n\
             ## Future Outlook\n[Emerging trends and projections]\n\n\
             ## Strategic Recommendations\n[Actionable guidance]\n\n\
             ## Risk Assessment\n[Key risks, limitations, and open challenges]\n\n\
             ## Conclusion\n[Closing assessment]\n\n\
             Here are the analyses to synthesize:\n"
        );

        for (provider, analysis) in input {
            prompt.push_str(&format!(
                "\n{} Analysis:\n{}\n",
                provider.display_name(),
                analysis
            ));
        }

        prompt
    }

    /// One LLM synthesis call behind the synthesis retry schedule. All
    /// successful analyses are handed over verbatim.
    async fn delegate(
        &self,
        topic: &str,
        input: &[(ProviderId, String)],
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::synthesis_prompt(topic, input) },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_output_tokens,
        });
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = self.config.model.as_str(), "Sending synthesis request");

        let outcome = invoke_with_retry(&self.policy, |timeout| {
            let request = self.http.post(&url).bearer_auth(api_key).json(&body);
            async move {
                let value = send_json("OpenAI", request, timeout).await?;
                OpenAiClient::parse_content(&value)
            }
        })
        .await;

        outcome.result
    }
}

#[async_trait]
impl Synthesizer for SynthesisEngine {
    async fn synthesize(
        &self,
        topic: &str,
        input: Vec<(ProviderId, String)>,
    ) -> Result<Report, SynthesisError> {
        if input.is_empty() {
            return Err(SynthesisError::NoInput);
        }

        match self.config.mode {
            SynthesisMode::Assembly => Ok(assemble_report(topic, &input)),
            SynthesisMode::Llm => {
                let Some(api_key) = self.api_key.as_deref() else {
                    debug!("No synthesis API key configured; using deterministic assembly");
                    return Ok(assemble_report(topic, &input));
                };

                match self.delegate(topic, &input, api_key).await {
                    Ok(body) => Ok(Report::new(topic, body)),
                    Err(e) if self.config.fall_back_on_error => {
                        warn!(
                            "Synthesis call failed ({}); falling back to deterministic assembly",
                            e
                        );
                        Ok(assemble_report(topic, &input))
                    }
                    Err(e) => Err(SynthesisError::Provider(e)),
                }
            }
        }
    }
}
