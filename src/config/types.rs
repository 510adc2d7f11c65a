use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ProvidersConfig {
    #[serde(default = "default_openai_config")]
    pub openai: ProviderConfig,

    #[serde(default = "default_anthropic_config")]
    pub anthropic: ProviderConfig,

    #[serde(default = "default_gemini_config")]
    pub gemini: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: default_openai_config(),
            anthropic: default_anthropic_config(),
            gemini: default_gemini_config(),
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, id: ProviderId) -> &ProviderConfig {
        match id {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Anthropic => &self.anthropic,
            ProviderId::Gemini => &self.gemini,
        }
    }

    /// Enabled providers in configured order. Result ordering in an
    /// orchestration outcome follows this order, not completion order.
    pub fn enabled(&self) -> Vec<(ProviderId, &ProviderConfig)> {
        let all = [
            (ProviderId::OpenAi, &self.openai),
            (ProviderId::Anthropic, &self.anthropic),
            (ProviderId::Gemini, &self.gemini),
        ];
        all.into_iter().filter(|(_, c)| c.enabled).collect()
    }
}

/// Settings for one upstream analyst. The API key itself never appears in
/// the config file; only the name of the environment variable holding it.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub api_key_env: String,

    #[serde(default)]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Override the provider endpoint, e.g. for a proxy.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_timeout_sec")]
    pub initial_timeout_sec: u64,

    #[serde(default = "default_timeout_ceiling_sec")]
    pub timeout_ceiling_sec: u64,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_timeout_sec: default_initial_timeout_sec(),
            timeout_ceiling_sec: default_timeout_ceiling_sec(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SynthesisConfig {
    #[serde(default)]
    pub mode: SynthesisMode,

    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_synthesis_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_synthesis_max_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub base_url: Option<String>,

    /// When the LLM synthesis call exhausts its retries, fall back to the
    /// deterministic assembly instead of failing the run.
    #[serde(default = "default_true")]
    pub fall_back_on_error: bool,

    // Synthesis prompts are larger than analysis prompts, so the synthesis
    // invoker gets its own, longer timeout schedule.
    #[serde(default = "default_synthesis_initial_timeout_sec")]
    pub initial_timeout_sec: u64,

    #[serde(default = "default_synthesis_timeout_ceiling_sec")]
    pub timeout_ceiling_sec: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            mode: SynthesisMode::default(),
            api_key_env: default_openai_key_env(),
            model: default_synthesis_model(),
            temperature: default_temperature(),
            max_output_tokens: default_synthesis_max_tokens(),
            base_url: None,
            fall_back_on_error: true,
            initial_timeout_sec: default_synthesis_initial_timeout_sec(),
            timeout_ceiling_sec: default_synthesis_timeout_ceiling_sec(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    /// Delegate synthesis to an LLM call.
    #[default]
    Llm,
    /// Deterministic text-mining assembly, no further network calls.
    Assembly,
}

impl std::str::FromStr for SynthesisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "llm" => Ok(SynthesisMode::Llm),
            "assembly" => Ok(SynthesisMode::Assembly),
            _ => Err(format!("Unknown synthesis mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderId {
    /// Human-facing analyst name, as shown in reports and summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OpenAI",
            ProviderId::Anthropic => "Claude",
            ProviderId::Gemini => "Gemini",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderId::OpenAi => write!(f, "openai"),
            ProviderId::Anthropic => write!(f, "anthropic"),
            ProviderId::Gemini => write!(f, "gemini"),
        }
    }
}
