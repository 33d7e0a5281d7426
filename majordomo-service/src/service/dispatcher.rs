//! Routes a named invocation to its handler and normalizes the outcome.
//!
//! `dispatch` always yields a string; every failure becomes a structured
//! error payload the model can read.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::builtins::BuiltinCapabilities;
use super::catalog::build_catalog;
use super::state::InvocationResult;
use crate::error::CapabilityError;
use crate::llm::InvocationRequest;
use crate::remote::{RemoteRegistry, split_namespaced};
use crate::tools::{CapabilityDescriptor, RawArguments, truncate};

/// Characters of arguments and results kept in logs
const LOG_PREVIEW_CHARS: usize = 200;

pub struct Dispatcher {
    builtins: Arc<BuiltinCapabilities>,
    remote: Arc<RemoteRegistry>,
}

impl Dispatcher {
    pub fn new(builtins: Arc<BuiltinCapabilities>, remote: Arc<RemoteRegistry>) -> Self {
        Self { builtins, remote }
    }

    /// Snapshot of every capability currently callable
    pub fn catalog(&self, include_remote: bool) -> Vec<CapabilityDescriptor> {
        build_catalog(&self.builtins, &self.remote, include_remote)
    }

    /// Run one capability and return its payload
    pub async fn dispatch(&self, name: &str, raw_arguments: &RawArguments) -> String {
        info!(
            capability = %name,
            args = %raw_arguments.preview(LOG_PREVIEW_CHARS),
            "Dispatching capability"
        );

        let payload = self.route(name, raw_arguments).await;

        debug!(
            capability = %name,
            result = %truncate(&payload, LOG_PREVIEW_CHARS),
            "Capability finished"
        );
        payload
    }

    async fn route(&self, name: &str, raw_arguments: &RawArguments) -> String {
        let args = match raw_arguments.parse() {
            Ok(args) => args,
            Err(message) => {
                warn!(capability = %name, error = %message, "Rejecting malformed arguments");
                return CapabilityError::argument(message).to_payload(name);
            }
        };

        if let Some((provider_id, remote_name)) = split_namespaced(name) {
            return self
                .remote
                .invoke(provider_id, remote_name, args.into_value())
                .await;
        }

        let Some(capability) = self.builtins.get(name) else {
            return CapabilityError::UnknownCapability {
                name: name.to_string(),
            }
            .to_payload(name);
        };

        match capability.invoke(&args).await {
            Ok(output) => output.into_payload(),
            Err(e) => {
                warn!(capability = %name, kind = e.kind(), error = %e, "Capability failed");
                e.to_payload(name)
            }
        }
    }

    /// Dispatch every call concurrently; results keep request order
    pub async fn dispatch_all(&self, calls: &[InvocationRequest]) -> Vec<InvocationResult> {
        join_all(calls.iter().map(|call| async move {
            let payload = self
                .dispatch(&call.capability_name, &call.raw_arguments)
                .await;
            InvocationResult {
                call_id: call.call_id.clone(),
                capability_name: call.capability_name.clone(),
                is_error: is_error_payload(&payload),
                payload,
            }
        }))
        .await
    }
}

/// Whether a payload is the structured error shape
pub fn is_error_payload(payload: &str) -> bool {
    serde_json::from_str::<Value>(payload)
        .ok()
        .and_then(|value| {
            let object = value.as_object()?;
            Some(object.contains_key("error") && object.contains_key("kind"))
        })
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;
    use crate::remote::tests::{FakeTransport, provider, registry, tool};
    use crate::service::builtins::tests::unlinked_context;

    pub(crate) fn dispatcher_with(transport: FakeTransport, providers: &[&str]) -> (Dispatcher, Arc<RemoteRegistry>) {
        let builtins = Arc::new(BuiltinCapabilities::new(unlinked_context()));
        let (remote, _) = registry(providers.iter().map(|id| provider(id)).collect(), transport);
        let remote = Arc::new(remote);
        (Dispatcher::new(builtins, remote.clone()), remote)
    }

    fn payload_json(payload: &str) -> Value {
        serde_json::from_str(payload).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_capability_is_a_payload() {
        let (dispatcher, _) = dispatcher_with(FakeTransport::default(), &[]);

        let payload = dispatcher
            .dispatch("fly_to_moon", &RawArguments::Structured(json!({})))
            .await;
        let value = payload_json(&payload);
        assert_eq!(value["kind"], "unknown_capability");
        assert_eq!(value["capability"], "fly_to_moon");
        assert!(is_error_payload(&payload));
    }

    #[tokio::test]
    async fn test_malformed_arguments_cite_capability() {
        let (dispatcher, _) = dispatcher_with(FakeTransport::default(), &[]);

        let payload = dispatcher
            .dispatch("create_task", &RawArguments::Text("{\"title\": \"Buy".to_string()))
            .await;
        let value = payload_json(&payload);
        assert_eq!(value["kind"], "invalid_arguments");
        assert_eq!(value["capability"], "create_task");
    }

    #[tokio::test]
    async fn test_deeply_nested_expression_is_a_payload() {
        let (dispatcher, _) = dispatcher_with(FakeTransport::default(), &[]);
        let expression = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));

        let payload = dispatcher
            .dispatch("calculate", &RawArguments::Structured(json!({ "expression": expression })))
            .await;
        let value = payload_json(&payload);
        assert_eq!(value["kind"], "invalid_arguments");
        assert_eq!(value["capability"], "calculate");
    }

    #[tokio::test]
    async fn test_builtin_success_and_failure() {
        let (dispatcher, _) = dispatcher_with(FakeTransport::default(), &[]);

        let ok = dispatcher
            .dispatch("calculate", &RawArguments::Text(r#"{"expression": "2+3*4"}"#.to_string()))
            .await;
        assert_eq!(payload_json(&ok), json!({"result": "14"}));
        assert!(!is_error_payload(&ok));

        let failed = dispatcher
            .dispatch("list_tasks", &RawArguments::Structured(json!({})))
            .await;
        let value = payload_json(&failed);
        assert_eq!(value["kind"], "not_connected");
        assert!(value["error"].as_str().unwrap().contains("Google Tasks not connected"));
    }

    #[tokio::test]
    async fn test_same_remote_name_routes_per_provider() {
        let transport = FakeTransport::default()
            .with_provider("https://weather.example/mcp", vec![tool("get_data")])
            .with_provider("https://search.example/mcp", vec![tool("get_data")]);
        let (dispatcher, remote) = dispatcher_with(transport, &["weather", "search"]);

        assert!(remote.connect("weather", None).await.unwrap().success);
        assert!(remote.connect("search", None).await.unwrap().success);

        let names: Vec<_> = dispatcher
            .catalog(true)
            .into_iter()
            .map(|d| d.name)
            .filter(|n| n.starts_with("mcp_"))
            .collect();
        assert_eq!(names, vec!["mcp_search_get_data", "mcp_weather_get_data"]);

        let args = RawArguments::Structured(json!({"q": 1}));
        let weather = dispatcher.dispatch("mcp_weather_get_data", &args).await;
        let search = dispatcher.dispatch("mcp_search_get_data", &args).await;
        assert!(weather.starts_with("https://weather.example/mcp answered get_data"));
        assert!(search.starts_with("https://search.example/mcp answered get_data"));
    }

    #[tokio::test]
    async fn test_disconnected_remote_gives_guidance() {
        let (dispatcher, _) = dispatcher_with(FakeTransport::default(), &["zerodha"]);

        let payload = dispatcher
            .dispatch("mcp_zerodha_get_holdings", &RawArguments::Structured(json!({})))
            .await;
        let value = payload_json(&payload);
        assert_eq!(value["kind"], "not_connected");
        assert!(value["error"].as_str().unwrap().contains("Reconnect"));
    }

    #[tokio::test]
    async fn test_dispatch_all_keeps_order() {
        let (dispatcher, _) = dispatcher_with(FakeTransport::default(), &[]);
        let calls = vec![
            InvocationRequest {
                call_id: "a".to_string(),
                capability_name: "calculate".to_string(),
                raw_arguments: RawArguments::Structured(json!({"expression": "1+1"})),
            },
            InvocationRequest {
                call_id: "b".to_string(),
                capability_name: "nope".to_string(),
                raw_arguments: RawArguments::Structured(json!({})),
            },
        ];

        let results = dispatcher.dispatch_all(&calls).await;
        assert_eq!(results[0].call_id, "a");
        assert!(!results[0].is_error);
        assert_eq!(results[1].call_id, "b");
        assert!(results[1].is_error);
    }
}
