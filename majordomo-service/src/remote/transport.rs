//! HTTP transport for remote capability providers.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use super::protocol::{JsonRpcRequest, JsonRpcResponse, parse_body};
use crate::config::RuntimeConfig;
use crate::error::TransportError;

/// One request/response exchange with a provider endpoint
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        credential: Option<&str>,
        request: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, TransportError>;
}

/// JSON-RPC over HTTP POST, accepting JSON or event-stream replies
pub struct HttpTransport {
    client: Client,
    runtime_config: Arc<RuntimeConfig>,
}

impl HttpTransport {
    pub fn new(runtime_config: Arc<RuntimeConfig>) -> Result<Self, TransportError> {
        let client = Client::builder().user_agent("Majordomo/1.0").build()?;
        Ok(Self {
            client,
            runtime_config,
        })
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &str,
        credential: Option<&str>,
        request: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, TransportError> {
        // Read per request so a settings change applies without a restart
        let timeout = self.runtime_config.dynamic().remote.timeout();

        let mut builder = self
            .client
            .post(endpoint)
            .timeout(timeout)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(request);
        if let Some(token) = credential {
            builder = builder.bearer_auth(token);
        }

        debug!(endpoint = %endpoint, method = %request.method, id = request.id, "Sending remote request");
        let response = builder.send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: crate::tools::truncate(body.trim(), 300),
            });
        }

        parse_body(&content_type, &body)
    }
}
