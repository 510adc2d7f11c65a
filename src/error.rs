use crate::runner::OrchestrationOutcome;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Classified failure of a single upstream provider call.
///
/// Variants are mutually exclusive; classification order is input validation,
/// then credentials, then throttling, then timeout, then upstream status,
/// then payload shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{provider} API key is not configured (set {env_var})")]
    AuthConfigMissing { provider: String, env_var: String },

    #[error("rate limited by upstream{}", format_retry_after(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("request timed out after {0:?}")]
    UpstreamTimeout(Duration),

    #[error("{provider} API error: {message}")]
    UpstreamError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Whether the invoker may retry after this failure.
    ///
    /// Only throttling, timeouts, and upstream errors are presumed
    /// transient. Input and credential failures never change between
    /// attempts; a 2xx with a broken payload is not retried either.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::UpstreamTimeout(_)
                | ProviderError::UpstreamError { .. }
        )
    }

    /// Provider-declared delay before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

fn format_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("No providers enabled")]
    NoProvidersEnabled,

    #[error("Provider '{provider}' is enabled but '{field}' is not set")]
    IncompleteProvider { provider: String, field: String },
}

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("synthesis call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("no successful analyses to synthesize")]
    NoInput,
}

/// Terminal outcome of one orchestration run, surfaced to the caller.
#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("topic must be a non-empty string")]
    InvalidTopic,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Every configured provider exhausted its retries. Carries the message
    /// of the most recently observed failure plus the full outcome so the
    /// caller can inspect per-provider errors.
    #[error("all providers failed: {message}")]
    AllProvidersFailed {
        message: String,
        outcome: Box<OrchestrationOutcome>,
    },

    /// Synthesis failed after retries with no fallback configured. The
    /// gathered analyses remain available in `outcome`.
    #[error("synthesis failed: {message}")]
    SynthesisFailed {
        message: String,
        outcome: Box<OrchestrationOutcome>,
    },

    #[error("Failed to write report: {0}")]
    WriteReport(#[from] std::io::Error),
}
