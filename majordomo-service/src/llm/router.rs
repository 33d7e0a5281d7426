//! Routes a model selector to the provider that serves it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::{ChatModel, ChatRequest, ModelTurn, OllamaClient, OpenAiCompatClient, StreamEvent};
use crate::config::{DynamicConfig, LlmConfig};
use crate::error::LlmError;

/// Model families the default provider is known to serve
const KNOWN_FAMILIES: &[&str] = &["llama", "mixtral", "gemma", "gpt-oss", "qwen", "kimi"];

/// Short requests without tools may use the low-cost model
const LOW_COST_MAX_CHARS: usize = 80;

pub const OPENAI_COMPAT_PROVIDER: &str = "openai_compat";
pub const OLLAMA_PROVIDER: &str = "ollama";

/// Named chat providers plus a default.
///
/// A selector `"<provider>/<model>"` whose prefix names a registered provider
/// goes there with the prefix stripped; anything else goes to the default
/// provider unchanged, so `openai/gpt-oss-20b` stays a Groq model name.
pub struct ModelRouter {
    providers: HashMap<String, Arc<dyn ChatModel>>,
    default_provider: String,
}

impl ModelRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn with_provider(mut self, name: impl Into<String>, model: Arc<dyn ChatModel>) -> Self {
        self.providers.insert(name.into(), model);
        self
    }

    /// Build the router for the current dynamic configuration
    pub fn from_config(config: &DynamicConfig) -> Result<Self, LlmError> {
        let openai = OpenAiCompatClient::new(&config.openai_compat)?;
        let ollama = OllamaClient::new(&config.ollama)?;

        Ok(Self::new(config.llm.default_provider.clone())
            .with_provider(OPENAI_COMPAT_PROVIDER, Arc::new(openai))
            .with_provider(OLLAMA_PROVIDER, Arc::new(ollama)))
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Whether a selector's prefix names a registered provider
    fn names_provider(&self, selector: &str) -> bool {
        selector
            .split_once('/')
            .is_some_and(|(prefix, _)| self.has_provider(prefix))
    }

    fn resolve(&self, selector: &str) -> Result<(Arc<dyn ChatModel>, String), LlmError> {
        if let Some((prefix, model)) = selector.split_once('/')
            && let Some(provider) = self.providers.get(prefix)
        {
            return Ok((provider.clone(), model.to_string()));
        }

        let provider =
            self.providers
                .get(&self.default_provider)
                .ok_or_else(|| LlmError::UnknownProvider {
                    provider: self.default_provider.clone(),
                })?;
        Ok((provider.clone(), selector.to_string()))
    }

    /// Pick the model for a turn, applying cost control
    pub fn select_model(
        &self,
        llm: &LlmConfig,
        requested: Option<&str>,
        tools_enabled: bool,
        user_text: &str,
    ) -> String {
        if let Some(requested) = requested.map(str::trim).filter(|r| !r.is_empty()) {
            let lower = requested.to_lowercase();
            if self.names_provider(requested) || KNOWN_FAMILIES.iter().any(|f| lower.contains(f)) {
                return requested.to_string();
            }
            debug!(requested = %requested, "Ignoring unrecognized model selector");
        }

        let text = user_text.trim();
        if !tools_enabled && !text.is_empty() && text.chars().count() <= LOW_COST_MAX_CHARS {
            return llm.low_cost_model.clone();
        }

        llm.default_model.clone()
    }
}

#[async_trait]
impl ChatModel for ModelRouter {
    async fn complete(&self, mut request: ChatRequest) -> Result<ModelTurn, LlmError> {
        let (provider, model) = self.resolve(&request.model)?;
        request.model = model;
        provider.complete(request).await
    }

    async fn stream(&self, mut request: ChatRequest) -> Result<mpsc::Receiver<StreamEvent>, LlmError> {
        let (provider, model) = self.resolve(&request.model)?;
        request.model = model;
        provider.stream(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the model name each request arrives with
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatModel for Recorder {
        async fn complete(&self, request: ChatRequest) -> Result<ModelTurn, LlmError> {
            self.seen.lock().unwrap().push(request.model.clone());
            Ok(ModelTurn::Answer(request.model))
        }

        async fn stream(&self, _request: ChatRequest) -> Result<mpsc::Receiver<StreamEvent>, LlmError> {
            let (tx, rx) = mpsc::channel(1);
            tx.send(StreamEvent::Done).await.unwrap();
            Ok(rx)
        }
    }

    fn router() -> (ModelRouter, Arc<Recorder>, Arc<Recorder>) {
        let groq = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        let local = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        let router = ModelRouter::new(OPENAI_COMPAT_PROVIDER)
            .with_provider(OPENAI_COMPAT_PROVIDER, groq.clone())
            .with_provider(OLLAMA_PROVIDER, local.clone());
        (router, groq, local)
    }

    fn request(model: &str) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: Vec::new(),
            tools: None,
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn test_prefix_routes_and_strips() {
        let (router, groq, local) = router();

        router.complete(request("ollama/llama3.2")).await.unwrap();
        router.complete(request("openai/gpt-oss-20b")).await.unwrap();

        assert_eq!(*local.seen.lock().unwrap(), vec!["llama3.2".to_string()]);
        assert_eq!(*groq.seen.lock().unwrap(), vec!["openai/gpt-oss-20b".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_default_provider() {
        let router = ModelRouter::new("nowhere");
        let err = router.complete(request("x")).await.unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider { .. }));
    }

    #[test]
    fn test_cost_control() {
        let (router, _, _) = router();
        let llm = DynamicConfig::default().llm;

        // Known family is honored
        assert_eq!(
            router.select_model(&llm, Some("qwen-qwq-32b"), true, "hi"),
            "qwen-qwq-32b"
        );
        // Registered provider prefix is honored
        assert_eq!(
            router.select_model(&llm, Some("ollama/phi4"), true, "hi"),
            "ollama/phi4"
        );
        // Unknown selector, short text, no tools: low cost
        assert_eq!(
            router.select_model(&llm, Some("mystery"), false, "what's 2+2?"),
            llm.low_cost_model
        );
        // Tools enabled: default model
        assert_eq!(router.select_model(&llm, None, true, "hi"), llm.default_model);
        // Long text: default model
        let long = "a".repeat(81);
        assert_eq!(router.select_model(&llm, None, false, &long), llm.default_model);
    }
}
