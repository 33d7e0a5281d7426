//! Key-value conversion and DB merging logic for DynamicConfig.

use std::collections::HashMap;

use serde_json::{Value, json};

use super::DynamicConfig;

/// Shown instead of a configured API key
const REDACTED: &str = "********";

impl DynamicConfig {
    /// Convert config to key-value map for API response
    pub fn to_key_value_map(&self) -> HashMap<String, Value> {
        let api_key = if self.openai_compat.api_key.is_empty() {
            Value::String(String::new())
        } else {
            Value::String(REDACTED.to_string())
        };

        let entries = [
            // LLM settings
            ("llm.default_provider", json!(self.llm.default_provider)),
            ("llm.default_model", json!(self.llm.default_model)),
            ("llm.low_cost_model", json!(self.llm.low_cost_model)),
            ("llm.temperature", json!(self.llm.temperature)),
            ("llm.max_output_tokens", json!(self.llm.max_output_tokens)),
            ("llm.summary_max_tokens", json!(self.llm.summary_max_tokens)),
            (
                "llm.summary_temperature",
                json!(self.llm.summary_temperature),
            ),
            // Provider endpoints
            ("openai_compat.base_url", json!(self.openai_compat.base_url)),
            ("openai_compat.api_key", api_key),
            (
                "openai_compat.request_timeout_secs",
                json!(self.openai_compat.request_timeout_secs),
            ),
            ("ollama.base_url", json!(self.ollama.base_url)),
            (
                "ollama.request_timeout_secs",
                json!(self.ollama.request_timeout_secs),
            ),
            // Conversation settings
            (
                "conversation.max_input_messages",
                json!(self.conversation.max_input_messages),
            ),
            // Assistant settings
            ("assistant.name", json!(self.assistant.name)),
            (
                "assistant.utc_offset_minutes",
                json!(self.assistant.utc_offset_minutes),
            ),
            (
                "assistant.timezone_label",
                json!(self.assistant.timezone_label),
            ),
            // Remote provider settings
            ("remote.timeout_secs", json!(self.remote.timeout_secs)),
            // Integration settings
            (
                "integrations.weather_base_url",
                json!(self.integrations.weather_base_url),
            ),
            (
                "integrations.weather_timeout_secs",
                json!(self.integrations.weather_timeout_secs),
            ),
            (
                "integrations.weather_cache_secs",
                json!(self.integrations.weather_cache_secs),
            ),
            (
                "integrations.default_city",
                json!(self.integrations.default_city),
            ),
            (
                "integrations.search_base_url",
                json!(self.integrations.search_base_url),
            ),
            (
                "integrations.search_timeout_secs",
                json!(self.integrations.search_timeout_secs),
            ),
            (
                "integrations.default_news_topic",
                json!(self.integrations.default_news_topic),
            ),
        ];

        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    /// Apply DB settings as overrides to this config
    pub fn merge_from_db(&mut self, db_settings: &HashMap<String, Value>) {
        for (key, value) in db_settings {
            self.apply_setting(key, value);
        }
    }

    /// Whether a value would be accepted for `key`
    pub fn accepts_setting(key: &str, value: &Value) -> bool {
        Self::default().apply_setting(key, value)
    }

    /// Apply a single setting value. Values of the wrong type or out of range
    /// are ignored and reported as rejected.
    fn apply_setting(&mut self, key: &str, value: &Value) -> bool {
        match key {
            // LLM settings
            "llm.default_provider" => set_string(&mut self.llm.default_provider, value),
            "llm.default_model" => set_string(&mut self.llm.default_model, value),
            "llm.low_cost_model" => set_string(&mut self.llm.low_cost_model, value),
            "llm.temperature" => set_f32(&mut self.llm.temperature, value),
            "llm.max_output_tokens" => set_u32(&mut self.llm.max_output_tokens, value),
            "llm.summary_max_tokens" => set_u32(&mut self.llm.summary_max_tokens, value),
            "llm.summary_temperature" => set_f32(&mut self.llm.summary_temperature, value),

            // Provider endpoints
            "openai_compat.base_url" => set_string(&mut self.openai_compat.base_url, value),
            "openai_compat.api_key" => {
                // The redacted placeholder echoes back from GET; never store it
                value.as_str() == Some(REDACTED)
                    || set_string(&mut self.openai_compat.api_key, value)
            }
            "openai_compat.request_timeout_secs" => {
                set_u64(&mut self.openai_compat.request_timeout_secs, value)
            }
            "ollama.base_url" => set_string(&mut self.ollama.base_url, value),
            "ollama.request_timeout_secs" => set_u64(&mut self.ollama.request_timeout_secs, value),

            // Conversation settings
            "conversation.max_input_messages" => {
                match value.as_u64().and_then(|v| usize::try_from(v).ok()) {
                    Some(v) => {
                        self.conversation.max_input_messages = v;
                        true
                    }
                    None => false,
                }
            }

            // Assistant settings
            "assistant.name" => set_string(&mut self.assistant.name, value),
            "assistant.utc_offset_minutes" => {
                match value
                    .as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .filter(|v| v.abs() < MINUTES_PER_DAY)
                {
                    Some(v) => {
                        self.assistant.utc_offset_minutes = v;
                        true
                    }
                    None => false,
                }
            }
            "assistant.timezone_label" => set_string(&mut self.assistant.timezone_label, value),

            // Remote provider settings
            "remote.timeout_secs" => set_u64(&mut self.remote.timeout_secs, value),

            // Integration settings
            "integrations.weather_base_url" => {
                set_string(&mut self.integrations.weather_base_url, value)
            }
            "integrations.weather_timeout_secs" => {
                set_u64(&mut self.integrations.weather_timeout_secs, value)
            }
            "integrations.weather_cache_secs" => {
                set_u64(&mut self.integrations.weather_cache_secs, value)
            }
            "integrations.default_city" => set_string(&mut self.integrations.default_city, value),
            "integrations.search_base_url" => {
                set_string(&mut self.integrations.search_base_url, value)
            }
            "integrations.search_timeout_secs" => {
                set_u64(&mut self.integrations.search_timeout_secs, value)
            }
            "integrations.default_news_topic" => {
                set_string(&mut self.integrations.default_news_topic, value)
            }

            _ => {
                tracing::warn!(key = %key, "Ignoring unknown setting key from database");
                false
            }
        }
    }
}

/// Offsets must stay strictly inside one day
const MINUTES_PER_DAY: i32 = 24 * 60;

fn set_string(field: &mut String, value: &Value) -> bool {
    match value.as_str() {
        Some(v) => {
            *field = v.to_string();
            true
        }
        None => false,
    }
}

fn set_u64(field: &mut u64, value: &Value) -> bool {
    match value.as_u64() {
        Some(v) => {
            *field = v;
            true
        }
        None => false,
    }
}

fn set_u32(field: &mut u32, value: &Value) -> bool {
    match value.as_u64().and_then(|v| u32::try_from(v).ok()) {
        Some(v) => {
            *field = v;
            true
        }
        None => false,
    }
}

fn set_f32(field: &mut f32, value: &Value) -> bool {
    match value.as_f64() {
        Some(v) => {
            *field = v as f32;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_valid_key_is_reported() {
        let config = DynamicConfig::default();
        let map = config.to_key_value_map();
        for key in DynamicConfig::valid_keys() {
            assert!(map.contains_key(key), "missing {key}");
        }
        assert_eq!(map.len(), DynamicConfig::valid_keys().len());
    }

    #[test]
    fn test_merge_overrides_and_ignores_wrong_types() {
        let mut config = DynamicConfig::default();
        let mut settings = HashMap::new();
        settings.insert("llm.default_model".to_string(), json!("qwen-qwq-32b"));
        settings.insert("conversation.max_input_messages".to_string(), json!(4));
        settings.insert("remote.timeout_secs".to_string(), json!("not a number"));

        config.merge_from_db(&settings);

        assert_eq!(config.llm.default_model, "qwen-qwq-32b");
        assert_eq!(config.conversation.max_input_messages, 4);
        assert_eq!(config.remote.timeout_secs, 30);
    }

    #[test]
    fn test_out_of_range_numbers_are_rejected() {
        let mut config = DynamicConfig::default();
        let defaults = DynamicConfig::default();
        let mut settings = HashMap::new();
        settings.insert("llm.max_output_tokens".to_string(), json!(5_000_000_000u64));
        settings.insert("assistant.utc_offset_minutes".to_string(), json!(3_000_000_000i64));
        config.merge_from_db(&settings);

        assert_eq!(config.llm.max_output_tokens, defaults.llm.max_output_tokens);
        assert_eq!(
            config.assistant.utc_offset_minutes,
            defaults.assistant.utc_offset_minutes
        );

        assert!(!DynamicConfig::accepts_setting("assistant.utc_offset_minutes", &json!(1440)));
        assert!(!DynamicConfig::accepts_setting("assistant.utc_offset_minutes", &json!(-2_000_000)));
        assert!(DynamicConfig::accepts_setting("assistant.utc_offset_minutes", &json!(-300)));
        assert!(!DynamicConfig::accepts_setting("llm.summary_max_tokens", &json!(-1)));
        assert!(DynamicConfig::accepts_setting("openai_compat.api_key", &json!(REDACTED)));
    }

    #[test]
    fn test_api_key_is_redacted_and_placeholder_not_stored() {
        let mut config = DynamicConfig::default();
        let mut settings = HashMap::new();
        settings.insert("openai_compat.api_key".to_string(), json!("gsk_secret"));
        config.merge_from_db(&settings);

        let map = config.to_key_value_map();
        assert_eq!(map["openai_compat.api_key"], json!(REDACTED));

        settings.insert("openai_compat.api_key".to_string(), json!(REDACTED));
        config.merge_from_db(&settings);
        assert_eq!(config.openai_compat.api_key, "gsk_secret");
    }
}
