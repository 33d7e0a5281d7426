//! Default value functions for DynamicConfig.

use super::schemas::{
    AssistantConfig, ConnectionMode, ConversationConfig, IntegrationsConfig, LlmConfig,
    OllamaConfig, OpenAiCompatConfig, ProviderSpec, RemoteConfig,
};

// ==================== Top-level Section Defaults ====================

pub(crate) fn default_llm() -> LlmConfig {
    LlmConfig {
        default_provider: default_provider(),
        default_model: default_model(),
        low_cost_model: default_low_cost_model(),
        temperature: default_temperature(),
        max_output_tokens: default_max_output_tokens(),
        summary_max_tokens: default_summary_max_tokens(),
        summary_temperature: default_summary_temperature(),
    }
}

pub(crate) fn default_openai_compat() -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        base_url: default_openai_compat_url(),
        api_key: String::new(),
        request_timeout_secs: default_openai_compat_timeout_secs(),
    }
}

pub(crate) fn default_ollama() -> OllamaConfig {
    OllamaConfig {
        base_url: default_ollama_url(),
        request_timeout_secs: default_ollama_timeout_secs(),
    }
}

pub(crate) fn default_conversation() -> ConversationConfig {
    ConversationConfig {
        max_input_messages: default_max_input_messages(),
    }
}

pub(crate) fn default_assistant() -> AssistantConfig {
    AssistantConfig {
        name: default_assistant_name(),
        utc_offset_minutes: default_utc_offset_minutes(),
        timezone_label: default_timezone_label(),
    }
}

pub(crate) fn default_remote() -> RemoteConfig {
    RemoteConfig {
        timeout_secs: default_remote_timeout_secs(),
        providers: default_providers(),
    }
}

pub(crate) fn default_integrations() -> IntegrationsConfig {
    IntegrationsConfig {
        weather_base_url: default_weather_url(),
        weather_timeout_secs: default_weather_timeout_secs(),
        weather_cache_secs: default_weather_cache_secs(),
        default_city: default_city(),
        search_base_url: default_search_url(),
        search_timeout_secs: default_search_timeout_secs(),
        default_news_topic: default_news_topic(),
    }
}

// ==================== LLM Defaults ====================

pub(crate) fn default_provider() -> String {
    "openai_compat".to_string()
}

pub(crate) fn default_model() -> String {
    "openai/gpt-oss-20b".to_string()
}

pub(crate) fn default_low_cost_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

pub(crate) fn default_temperature() -> f32 {
    0.3
}

pub(crate) fn default_max_output_tokens() -> u32 {
    350
}

pub(crate) fn default_summary_max_tokens() -> u32 {
    220
}

pub(crate) fn default_summary_temperature() -> f32 {
    0.2
}

// ==================== Provider Endpoint Defaults ====================

pub(crate) fn default_openai_compat_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

pub(crate) fn default_openai_compat_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

pub(crate) fn default_ollama_timeout_secs() -> u64 {
    120
}

// ==================== Conversation Defaults ====================

pub(crate) fn default_max_input_messages() -> usize {
    8
}

// ==================== Assistant Defaults ====================

pub(crate) fn default_assistant_name() -> String {
    "Majordomo".to_string()
}

pub(crate) fn default_utc_offset_minutes() -> i32 {
    330 // UTC+5:30
}

pub(crate) fn default_timezone_label() -> String {
    "IST".to_string()
}

// ==================== Remote Provider Defaults ====================

pub(crate) fn default_remote_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_providers() -> Vec<ProviderSpec> {
    vec![ProviderSpec {
        id: "zerodha".to_string(),
        display_name: "Zerodha Kite".to_string(),
        endpoint: "https://mcp.kite.trade/mcp".to_string(),
        auth_url: Some("https://mcp.kite.trade/".to_string()),
        requires_credential: false,
        icon: "📈".to_string(),
        description: "Access your Zerodha trading account - view holdings, positions, and market data"
            .to_string(),
        mode: ConnectionMode::Discovery,
        tools: Vec::new(),
    }]
}

// ==================== Integration Defaults ====================

pub(crate) fn default_weather_url() -> String {
    "https://wttr.in".to_string()
}

pub(crate) fn default_weather_timeout_secs() -> u64 {
    5
}

pub(crate) fn default_weather_cache_secs() -> u64 {
    600
}

pub(crate) fn default_city() -> String {
    "Mumbai".to_string()
}

pub(crate) fn default_search_url() -> String {
    "https://api.duckduckgo.com".to_string()
}

pub(crate) fn default_search_timeout_secs() -> u64 {
    10
}

pub(crate) fn default_news_topic() -> String {
    "technology".to_string()
}
