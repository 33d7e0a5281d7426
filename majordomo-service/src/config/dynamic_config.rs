//! Dynamic configuration that can be updated at runtime via API.
//! DB values override config file/env defaults.

mod defaults;
mod keys;
mod merging;
mod schemas;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use schemas::{
    AssistantConfig, ConnectionMode, ConversationConfig, FixedToolSpec, IntegrationsConfig,
    LlmConfig, OllamaConfig, OpenAiCompatConfig, ProviderSpec, RemoteConfig,
};

use defaults::{
    default_assistant, default_conversation, default_integrations, default_llm, default_ollama,
    default_openai_compat, default_remote,
};

/// Dynamic configuration that can be updated at runtime via API
/// DB values override config file/env defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicConfig {
    #[serde(default = "default_llm")]
    pub llm: LlmConfig,

    #[serde(default = "default_openai_compat")]
    pub openai_compat: OpenAiCompatConfig,

    #[serde(default = "default_ollama")]
    pub ollama: OllamaConfig,

    #[serde(default = "default_conversation")]
    pub conversation: ConversationConfig,

    #[serde(default = "default_assistant")]
    pub assistant: AssistantConfig,

    #[serde(default = "default_remote")]
    pub remote: RemoteConfig,

    #[serde(default = "default_integrations")]
    pub integrations: IntegrationsConfig,
}

impl DynamicConfig {
    /// Get all valid setting keys
    pub fn valid_keys() -> HashSet<&'static str> {
        keys::valid_keys()
    }
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            llm: default_llm(),
            openai_compat: default_openai_compat(),
            ollama: default_ollama(),
            conversation: default_conversation(),
            assistant: default_assistant(),
            remote: default_remote(),
            integrations: default_integrations(),
        }
    }
}
