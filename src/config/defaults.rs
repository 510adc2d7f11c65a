use super::types::ProviderConfig;

pub fn default_version() -> u32 {
    1
}

pub fn default_true() -> bool {
    true
}

pub fn default_temperature() -> f32 {
    0.7
}

pub fn default_max_output_tokens() -> u32 {
    2000
}

pub fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

pub fn default_openai_config() -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        api_key_env: default_openai_key_env(),
        model: "gpt-4-turbo-preview".to_string(),
        temperature: default_temperature(),
        max_output_tokens: default_max_output_tokens(),
        base_url: None,
    }
}

pub fn default_anthropic_config() -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        api_key_env: "ANTHROPIC_API_KEY".to_string(),
        model: "claude-3-sonnet-20240229".to_string(),
        temperature: default_temperature(),
        max_output_tokens: default_max_output_tokens(),
        base_url: None,
    }
}

pub fn default_gemini_config() -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        api_key_env: "GEMINI_API_KEY".to_string(),
        model: "gemini-2.0-flash".to_string(),
        temperature: default_temperature(),
        max_output_tokens: default_max_output_tokens(),
        base_url: None,
    }
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_initial_timeout_sec() -> u64 {
    30
}

pub fn default_timeout_ceiling_sec() -> u64 {
    120
}

pub fn default_backoff_base_ms() -> u64 {
    1000
}

pub fn default_synthesis_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

pub fn default_synthesis_max_tokens() -> u32 {
    2500
}

pub fn default_synthesis_initial_timeout_sec() -> u64 {
    45
}

pub fn default_synthesis_timeout_ceiling_sec() -> u64 {
    180
}
