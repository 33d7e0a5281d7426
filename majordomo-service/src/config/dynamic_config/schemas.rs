//! Configuration struct definitions for DynamicConfig sections.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model selection and generation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider used when the model selector does not name one
    #[serde(default = "super::defaults::default_provider")]
    pub default_provider: String,

    #[serde(default = "super::defaults::default_model")]
    pub default_model: String,

    /// Cheaper model for short requests that do not need tools
    #[serde(default = "super::defaults::default_low_cost_model")]
    pub low_cost_model: String,

    #[serde(default = "super::defaults::default_temperature")]
    pub temperature: f32,

    #[serde(default = "super::defaults::default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "super::defaults::default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    #[serde(default = "super::defaults::default_summary_temperature")]
    pub summary_temperature: f32,
}

/// OpenAI-compatible chat completions endpoint (Groq by default)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatConfig {
    #[serde(default = "super::defaults::default_openai_compat_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "super::defaults::default_openai_compat_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Ollama LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "super::defaults::default_ollama_url")]
    pub base_url: String,

    #[serde(default = "super::defaults::default_ollama_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Prior messages handed to the model (at least one is kept)
    #[serde(default = "super::defaults::default_max_input_messages")]
    pub max_input_messages: usize,
}

/// Persona and clock used in the system prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "super::defaults::default_assistant_name")]
    pub name: String,

    /// Offset from UTC used for "now" in prompts and get_time_now
    #[serde(default = "super::defaults::default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    #[serde(default = "super::defaults::default_timezone_label")]
    pub timezone_label: String,
}

impl AssistantConfig {
    /// The configured offset; out-of-range values fall back to UTC
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset())
    }
}

/// Remote capability providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Timeout for discovery and invocation requests
    #[serde(default = "super::defaults::default_remote_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "super::defaults::default_providers")]
    pub providers: Vec<ProviderSpec>,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How a provider's capability list is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Ask the endpoint via `tools/list` on connect
    #[default]
    Discovery,
    /// Install the statically configured `tools` list
    Fixed,
}

/// One entry in the remote provider directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Must not contain '_' (used as the namespace separator)
    pub id: String,
    pub display_name: String,
    pub endpoint: String,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub requires_credential: bool,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mode: ConnectionMode,
    /// Capabilities installed directly in fixed mode
    #[serde(default)]
    pub tools: Vec<FixedToolSpec>,
}

/// Statically-known remote capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

/// Third-party integrations backing built-in capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default = "super::defaults::default_weather_url")]
    pub weather_base_url: String,

    #[serde(default = "super::defaults::default_weather_timeout_secs")]
    pub weather_timeout_secs: u64,

    /// How long a city's current conditions stay cached
    #[serde(default = "super::defaults::default_weather_cache_secs")]
    pub weather_cache_secs: u64,

    #[serde(default = "super::defaults::default_city")]
    pub default_city: String,

    #[serde(default = "super::defaults::default_search_url")]
    pub search_base_url: String,

    #[serde(default = "super::defaults::default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    #[serde(default = "super::defaults::default_news_topic")]
    pub default_news_topic: String,
}

impl IntegrationsConfig {
    pub fn weather_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.weather_cache_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_offset_falls_back_to_utc() {
        let mut assistant = super::super::DynamicConfig::default().assistant;
        assistant.utc_offset_minutes = i32::MAX;
        assert_eq!(assistant.offset(), Utc.fix());

        assistant.utc_offset_minutes = 330;
        assert_eq!(assistant.offset().local_minus_utc(), 330 * 60);
    }
}
