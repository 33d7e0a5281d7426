//! The assistant service: composition root for the conversation loop.
//!
//! Owns the built-in capabilities, the remote registry and the model router,
//! and wires them into one [`Dispatcher`].

mod agentic_loop;
mod builtins;
mod catalog;
mod dispatcher;
mod prompts;
mod recovery;
mod state;

pub use builtins::{Backends, BuiltinCapabilities, BuiltinContext};
pub use catalog::{CatalogEntry, group_by_category};
pub use dispatcher::Dispatcher;
pub use state::{ChatEvent, TurnRequest};

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::config::{DynamicConfig, RuntimeConfig};
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::i18n::I18n;
use crate::llm::ModelRouter;
use crate::remote::{
    ConnectReport, ConnectionSummary, DisconnectReport, HttpTransport, ProviderDirectory,
    RemoteRegistry, ServerSummary,
};
use crate::tools::CapabilityDescriptor;

/// Main service coordinator
pub struct AssistantService {
    pub runtime_config: Arc<RuntimeConfig>,
    pub db: Arc<Database>,
    pub i18n: Arc<I18n>,
    /// Rebuilt when settings change
    models: ArcSwap<ModelRouter>,
    remote: Arc<RemoteRegistry>,
    dispatcher: Dispatcher,
}

impl AssistantService {
    /// Create a new service instance
    /// Accepts a pre-opened database so that RuntimeConfig can load settings from it
    pub fn new(db: Arc<Database>, runtime_config: Arc<RuntimeConfig>) -> ServiceResult<Self> {
        info!("Initializing Majordomo service");

        let dynamic = runtime_config.dynamic();

        let models = ModelRouter::from_config(&dynamic)?;
        info!(
            provider = %dynamic.llm.default_provider,
            model = %dynamic.llm.default_model,
            "Model router ready"
        );
        if dynamic.openai_compat.api_key.is_empty() {
            warn!("No API key configured for the OpenAI-compatible provider");
        }

        let directory = ProviderDirectory::from_specs(dynamic.remote.providers.clone())?;
        let transport =
            HttpTransport::new(runtime_config.clone()).map_err(|e| ServiceError::Internal {
                message: format!("Failed to create remote transport: {}", e),
            })?;
        let remote = Arc::new(RemoteRegistry::new(directory, Arc::new(transport)));
        drop(dynamic);

        let context = BuiltinContext::new(Backends::unlinked(), db.clone(), runtime_config.clone())?;
        let builtins = Arc::new(BuiltinCapabilities::new(Arc::new(context)));
        info!(count = builtins.len(), "Built-in capabilities registered");

        Ok(Self::from_parts(
            runtime_config,
            db,
            models,
            Dispatcher::new(builtins, remote.clone()),
            remote,
        ))
    }

    /// Assemble from already-built parts
    pub fn from_parts(
        runtime_config: Arc<RuntimeConfig>,
        db: Arc<Database>,
        models: ModelRouter,
        dispatcher: Dispatcher,
        remote: Arc<RemoteRegistry>,
    ) -> Self {
        Self {
            runtime_config,
            db,
            i18n: Arc::new(I18n::new()),
            models: ArcSwap::from_pointee(models),
            remote,
            dispatcher,
        }
    }

    /// Update settings and hot-reload affected components
    pub fn update_settings(&self, updates: HashMap<String, serde_json::Value>) -> ServiceResult<()> {
        let valid_keys = DynamicConfig::valid_keys();
        if let Some(unknown) = updates.keys().find(|k| !valid_keys.contains(k.as_str())) {
            return Err(ServiceError::InvalidRequest {
                message: format!("Unknown setting key: {}", unknown),
            });
        }
        if let Some((key, _)) = updates
            .iter()
            .find(|(k, v)| !v.is_null() && !DynamicConfig::accepts_setting(k, v))
        {
            return Err(ServiceError::InvalidRequest {
                message: format!("Invalid value for setting: {}", key),
            });
        }

        self.db.set_settings(updates)?;
        self.runtime_config.reload_from_db(&self.db)?;

        // Provider URLs, keys and timeouts live in the clients
        let models = ModelRouter::from_config(&self.runtime_config.dynamic())?;
        self.models.store(Arc::new(models));
        info!("Settings updated");

        Ok(())
    }

    /// Capabilities visible to a turn
    pub fn catalog(&self, include_remote: bool) -> Vec<CapabilityDescriptor> {
        self.dispatcher.catalog(include_remote)
    }

    pub async fn connect_remote(
        &self,
        provider_id: &str,
        credential: Option<String>,
    ) -> ServiceResult<ConnectReport> {
        self.remote.connect(provider_id, credential).await
    }

    pub fn disconnect_remote(&self, provider_id: &str) -> DisconnectReport {
        self.remote.disconnect(provider_id)
    }

    pub fn known_servers(&self) -> Vec<ServerSummary> {
        self.remote.known_servers()
    }

    pub fn remote_connections(&self) -> Vec<ConnectionSummary> {
        self.remote.connections()
    }

    pub fn remote_status(&self, provider_id: &str) -> ConnectionSummary {
        self.remote.connection_status(provider_id)
    }

    pub fn connected_remote_count(&self) -> usize {
        self.remote.connected_count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::StaticConfig;
    use crate::llm::ChatModel;
    use crate::remote::tests::FakeTransport;
    use crate::service::dispatcher::tests::dispatcher_with;

    const SCRIPTED_PROVIDER: &str = "scripted";

    /// Service whose every model call goes to `model`
    pub(crate) fn service_with_model(model: Arc<dyn ChatModel>) -> Arc<AssistantService> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let runtime_config = Arc::new(RuntimeConfig::new(
            StaticConfig::default(),
            DynamicConfig::default(),
        ));
        let (dispatcher, remote) = dispatcher_with(FakeTransport::default(), &["zerodha"]);
        let router = ModelRouter::new(SCRIPTED_PROVIDER).with_provider(SCRIPTED_PROVIDER, model);

        Arc::new(AssistantService::from_parts(
            runtime_config,
            db,
            router,
            dispatcher,
            remote,
        ))
    }

    #[test]
    fn test_new_registers_every_part() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let runtime_config = Arc::new(RuntimeConfig::new(
            StaticConfig::default(),
            DynamicConfig::default(),
        ));

        let service = tokio_test::assert_ok!(AssistantService::new(db, runtime_config));
        assert_eq!(service.connected_remote_count(), 0);
        assert!(service.known_servers().iter().any(|s| s.id == "zerodha"));
        assert!(service.catalog(true).iter().any(|d| d.name == "get_weather"));
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let runtime_config = Arc::new(RuntimeConfig::new(
            StaticConfig::default(),
            DynamicConfig::default(),
        ));
        let service = AssistantService::new(db, runtime_config).unwrap();

        let mut updates = HashMap::new();
        updates.insert("llm.nonsense".to_string(), json!(1));
        let err = tokio_test::assert_err!(service.update_settings(updates));
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
    }

    #[test]
    fn test_out_of_range_setting_rejected() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let runtime_config = Arc::new(RuntimeConfig::new(
            StaticConfig::default(),
            DynamicConfig::default(),
        ));
        let service = AssistantService::new(db, runtime_config).unwrap();

        let mut updates = HashMap::new();
        updates.insert("assistant.utc_offset_minutes".to_string(), json!(40_000_000));
        let err = tokio_test::assert_err!(service.update_settings(updates));
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
        assert!(service.db.get_all_settings().unwrap().is_empty());

        let mut updates = HashMap::new();
        updates.insert("assistant.utc_offset_minutes".to_string(), json!(-300));
        tokio_test::assert_ok!(service.update_settings(updates));
        assert_eq!(service.runtime_config.dynamic().assistant.utc_offset_minutes, -300);
    }
}
