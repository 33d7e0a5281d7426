//! Registry of live connections to remote capability providers.
//!
//! Connections are created by `connect`, dropped by `disconnect` and never
//! persisted; a restart drops them all. `invoke` and catalog building only
//! read connection state.

mod directory;
mod protocol;
mod transport;

pub use directory::ProviderDirectory;
pub use protocol::{JsonRpcRequest, JsonRpcResponse};
pub use transport::{HttpTransport, RemoteTransport};

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use strum::Display;
use tracing::{debug, info, warn};

use crate::config::{ConnectionMode, ProviderSpec};
use crate::error::{CapabilityError, ServiceError, ServiceResult, TransportError};
use crate::tools::CapabilityDescriptor;

/// First segment of every remote capability name
pub const REMOTE_PREFIX: &str = "mcp";

/// `mcp_<provider>_<name>`
pub fn namespaced_name(provider_id: &str, name: &str) -> String {
    format!("{}_{}_{}", REMOTE_PREFIX, provider_id, name)
}

/// Split a namespaced name into provider id and remote name.
///
/// Provider ids never contain `_`, so the first `_` after the prefix ends the id.
pub fn split_namespaced(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix(REMOTE_PREFIX)?.strip_prefix('_')?;
    let (provider_id, remote_name) = rest.split_once('_')?;
    if provider_id.is_empty() || remote_name.is_empty() {
        return None;
    }
    Some((provider_id, remote_name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// One live (or failed) connection
#[derive(Debug, Clone)]
pub struct RemoteConnection {
    pub provider_id: String,
    pub display_name: String,
    pub endpoint: String,
    pub status: ConnectionStatus,
    pub credential: Option<String>,
    pub capabilities: Vec<CapabilityDescriptor>,
    pub last_error: Option<String>,
    /// Identifies the `connect` call that created this entry
    attempt: u64,
}

impl RemoteConnection {
    fn connecting(spec: &ProviderSpec, credential: Option<String>, attempt: u64) -> Self {
        Self {
            provider_id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            endpoint: spec.endpoint.clone(),
            status: ConnectionStatus::Connecting,
            credential,
            capabilities: Vec::new(),
            last_error: None,
            attempt,
        }
    }
}

/// Outcome of `connect`
#[derive(Debug, Clone, Serialize)]
pub struct ConnectReport {
    pub success: bool,
    pub provider_id: String,
    pub capability_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of `disconnect`
#[derive(Debug, Clone, Serialize)]
pub struct DisconnectReport {
    pub success: bool,
    pub provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Directory entry merged with live connection state
#[derive(Debug, Clone, Serialize)]
pub struct ServerSummary {
    pub id: String,
    pub display_name: String,
    pub icon: String,
    pub description: String,
    pub auth_url: Option<String>,
    pub requires_credential: bool,
    pub mode: ConnectionMode,
    pub status: ConnectionStatus,
    pub capability_count: usize,
}

/// State of one connection as reported to callers
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSummary {
    pub provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub status: ConnectionStatus,
    pub capability_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RemoteConnection> for ConnectionSummary {
    fn from(conn: &RemoteConnection) -> Self {
        Self {
            provider_id: conn.provider_id.clone(),
            display_name: Some(conn.display_name.clone()),
            status: conn.status,
            capability_count: conn.capabilities.len(),
            error: conn.last_error.clone(),
        }
    }
}

/// Explicitly constructed registry of remote provider connections
pub struct RemoteRegistry {
    directory: ProviderDirectory,
    transport: Arc<dyn RemoteTransport>,
    connections: DashMap<String, RemoteConnection>,
    next_request_id: AtomicU64,
}

impl RemoteRegistry {
    pub fn new(directory: ProviderDirectory, transport: Arc<dyn RemoteTransport>) -> Self {
        Self {
            directory,
            transport,
            connections: DashMap::new(),
            next_request_id: AtomicU64::new(1),
        }
    }

    fn request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Connect to a known provider and install its capabilities.
    ///
    /// Unknown providers and missing credentials fail without touching any
    /// state. Discovery failures leave the connection in `error`.
    pub async fn connect(
        &self,
        provider_id: &str,
        credential: Option<String>,
    ) -> ServiceResult<ConnectReport> {
        let spec = self
            .directory
            .get(provider_id)
            .ok_or_else(|| ServiceError::UnknownProvider {
                provider_id: provider_id.to_string(),
            })?;

        let credential = credential.filter(|c| !c.trim().is_empty());
        if spec.requires_credential && credential.is_none() {
            return Err(ServiceError::InvalidRequest {
                message: format!("{} requires a credential to connect", spec.display_name),
            });
        }

        let attempt = self.request_id();
        info!(provider = %provider_id, mode = ?spec.mode, attempt, "Connecting to remote provider");
        self.connections.insert(
            provider_id.to_string(),
            RemoteConnection::connecting(spec, credential.clone(), attempt),
        );

        let discovered = match spec.mode {
            ConnectionMode::Fixed => Ok(fixed_capabilities(spec)),
            ConnectionMode::Discovery => self.discover(spec, credential.as_deref()).await,
        };

        // Only the attempt that created the entry may settle it
        let mut conn = match self.connections.get_mut(provider_id) {
            Some(conn) if conn.attempt == attempt => conn,
            Some(_) => {
                debug!(provider = %provider_id, attempt, "Connection attempt superseded");
                return Ok(abandoned(
                    provider_id,
                    format!("A newer connection to {} replaced this attempt", spec.display_name),
                ));
            }
            None => {
                return Ok(abandoned(
                    provider_id,
                    format!("Disconnected from {} while connecting", spec.display_name),
                ));
            }
        };

        match discovered {
            Ok(capabilities) => {
                let names: Vec<String> = capabilities.iter().map(|c| c.name.clone()).collect();
                conn.capabilities = capabilities;
                conn.status = ConnectionStatus::Connected;
                conn.last_error = None;
                drop(conn);

                info!(provider = %provider_id, capability_count = names.len(), "Connected to remote provider");
                Ok(ConnectReport {
                    success: true,
                    provider_id: provider_id.to_string(),
                    capability_count: names.len(),
                    capabilities: names,
                    error: None,
                })
            }
            Err(e) => {
                let message = e.to_string();
                conn.capabilities.clear();
                conn.status = ConnectionStatus::Error;
                conn.last_error = Some(message.clone());
                drop(conn);

                warn!(provider = %provider_id, error = %message, "Remote provider discovery failed");
                Ok(ConnectReport {
                    success: false,
                    provider_id: provider_id.to_string(),
                    capability_count: 0,
                    capabilities: Vec::new(),
                    error: Some(message),
                })
            }
        }
    }

    async fn discover(
        &self,
        spec: &ProviderSpec,
        credential: Option<&str>,
    ) -> Result<Vec<CapabilityDescriptor>, TransportError> {
        let request = JsonRpcRequest::list_tools(self.request_id());
        let result = self
            .transport
            .send(&spec.endpoint, credential, &request)
            .await?
            .into_result()?;

        let listed: protocol::ToolsListResult =
            serde_json::from_value(result).map_err(|e| TransportError::Malformed {
                message: format!("tools/list result: {}", e),
            })?;

        let mut seen = HashSet::new();
        let mut capabilities = Vec::with_capacity(listed.tools.len());
        for tool in listed.tools {
            if !seen.insert(tool.name.clone()) {
                warn!(provider = %spec.id, capability = %tool.name, "Ignoring duplicate remote capability");
                continue;
            }
            capabilities.push(CapabilityDescriptor {
                name: tool.name,
                description: tool.description.unwrap_or_default(),
                parameters: tool
                    .input_schema
                    .unwrap_or_else(CapabilityDescriptor::empty_parameters),
            });
        }
        Ok(capabilities)
    }

    /// Drop a connection entirely
    pub fn disconnect(&self, provider_id: &str) -> DisconnectReport {
        match self.connections.remove(provider_id) {
            Some(_) => {
                info!(provider = %provider_id, "Disconnected from remote provider");
                DisconnectReport {
                    success: true,
                    provider_id: provider_id.to_string(),
                    error: None,
                }
            }
            None => DisconnectReport {
                success: false,
                provider_id: provider_id.to_string(),
                error: Some(format!("Not connected to {}", provider_id)),
            },
        }
    }

    /// Invoke a remote capability; every failure becomes an error payload
    pub async fn invoke(&self, provider_id: &str, capability_name: &str, arguments: Value) -> String {
        let full_name = namespaced_name(provider_id, capability_name);

        let target = self.connections.get(provider_id).and_then(|conn| {
            (conn.status == ConnectionStatus::Connected)
                .then(|| (conn.endpoint.clone(), conn.credential.clone()))
        });
        let Some((endpoint, credential)) = target else {
            return self.not_connected(provider_id).to_payload(&full_name);
        };

        let request = JsonRpcRequest::call_tool(self.request_id(), capability_name, arguments);
        let outcome = match self
            .transport
            .send(&endpoint, credential.as_deref(), &request)
            .await
        {
            Ok(response) => response.into_result(),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) if protocol::is_error_result(&result) => {
                let message = protocol::extract_text(&result);
                debug!(capability = %full_name, error = %message, "Remote capability reported an error");
                CapabilityError::backend(message).to_payload(&full_name)
            }
            Ok(result) => protocol::extract_text(&result),
            Err(e) => {
                warn!(capability = %full_name, error = %e, "Remote invocation failed");
                CapabilityError::Transport(e).to_payload(&full_name)
            }
        }
    }

    fn not_connected(&self, provider_id: &str) -> CapabilityError {
        let display_name = self
            .directory
            .get(provider_id)
            .map(|spec| spec.display_name.clone())
            .unwrap_or_else(|| provider_id.to_string());

        let detail = self
            .connections
            .get(provider_id)
            .and_then(|conn| conn.last_error.clone())
            .map(|e| format!(" Last error: {}.", e))
            .unwrap_or_default();

        CapabilityError::NotConnected {
            message: format!(
                "{} is not connected.{} Reconnect it via Settings > Connected Services; \
                 daily access tokens expire and must be renewed.",
                display_name, detail
            ),
        }
    }

    /// Namespaced descriptors of every connected provider, ordered by provider id
    pub fn catalog_entries(&self) -> Vec<CapabilityDescriptor> {
        let mut connected: Vec<(String, String, Vec<CapabilityDescriptor>)> = self
            .connections
            .iter()
            .filter(|entry| entry.status == ConnectionStatus::Connected)
            .map(|entry| {
                (
                    entry.provider_id.clone(),
                    entry.display_name.clone(),
                    entry.capabilities.clone(),
                )
            })
            .collect();
        connected.sort_by(|a, b| a.0.cmp(&b.0));

        connected
            .into_iter()
            .flat_map(|(provider_id, display_name, capabilities)| {
                capabilities.into_iter().map(move |cap| {
                    let description = if cap.description.is_empty() {
                        "No description".to_string()
                    } else {
                        cap.description
                    };
                    CapabilityDescriptor {
                        name: namespaced_name(&provider_id, &cap.name),
                        description: format!("[{}] {}", display_name, description),
                        parameters: cap.parameters,
                    }
                })
            })
            .collect()
    }

    /// The directory with live status and capability counts
    pub fn known_servers(&self) -> Vec<ServerSummary> {
        self.directory
            .iter()
            .map(|spec| {
                let (status, capability_count) = self
                    .connections
                    .get(&spec.id)
                    .map(|c| (c.status, c.capabilities.len()))
                    .unwrap_or((ConnectionStatus::Disconnected, 0));
                ServerSummary {
                    id: spec.id.clone(),
                    display_name: spec.display_name.clone(),
                    icon: spec.icon.clone(),
                    description: spec.description.clone(),
                    auth_url: spec.auth_url.clone(),
                    requires_credential: spec.requires_credential,
                    mode: spec.mode,
                    status,
                    capability_count,
                }
            })
            .collect()
    }

    /// Every current connection, ordered by provider id
    pub fn connections(&self) -> Vec<ConnectionSummary> {
        let mut summaries: Vec<ConnectionSummary> = self
            .connections
            .iter()
            .map(|entry| ConnectionSummary::from(entry.value()))
            .collect();
        summaries.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        summaries
    }

    pub fn connection_status(&self, provider_id: &str) -> ConnectionSummary {
        self.connections
            .get(provider_id)
            .map(|conn| ConnectionSummary::from(conn.value()))
            .unwrap_or_else(|| ConnectionSummary {
                provider_id: provider_id.to_string(),
                display_name: self.directory.get(provider_id).map(|s| s.display_name.clone()),
                status: ConnectionStatus::Disconnected,
                capability_count: 0,
                error: None,
            })
    }

    pub fn connected_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.status == ConnectionStatus::Connected)
            .count()
    }
}

fn abandoned(provider_id: &str, error: String) -> ConnectReport {
    ConnectReport {
        success: false,
        provider_id: provider_id.to_string(),
        capability_count: 0,
        capabilities: Vec::new(),
        error: Some(error),
    }
}

fn fixed_capabilities(spec: &ProviderSpec) -> Vec<CapabilityDescriptor> {
    let mut seen = HashSet::new();
    spec.tools
        .iter()
        .filter(|tool| seen.insert(tool.name.clone()))
        .map(|tool| CapabilityDescriptor {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool
                .parameters
                .clone()
                .unwrap_or_else(CapabilityDescriptor::empty_parameters),
        })
        .collect()
}
