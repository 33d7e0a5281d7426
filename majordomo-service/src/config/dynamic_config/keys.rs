//! Valid setting keys for DynamicConfig.

use std::collections::HashSet;

/// All valid setting keys for DynamicConfig
pub const VALID_SETTING_KEYS: &[&str] = &[
    "llm.default_provider",
    "llm.default_model",
    "llm.low_cost_model",
    "llm.temperature",
    "llm.max_output_tokens",
    "llm.summary_max_tokens",
    "llm.summary_temperature",
    "openai_compat.base_url",
    "openai_compat.api_key",
    "openai_compat.request_timeout_secs",
    "ollama.base_url",
    "ollama.request_timeout_secs",
    "conversation.max_input_messages",
    "assistant.name",
    "assistant.utc_offset_minutes",
    "assistant.timezone_label",
    "remote.timeout_secs",
    "integrations.weather_base_url",
    "integrations.weather_timeout_secs",
    "integrations.weather_cache_secs",
    "integrations.default_city",
    "integrations.search_base_url",
    "integrations.search_timeout_secs",
    "integrations.default_news_topic",
];

/// Get all valid setting keys as a HashSet
pub fn valid_keys() -> HashSet<&'static str> {
    VALID_SETTING_KEYS.iter().copied().collect()
}
