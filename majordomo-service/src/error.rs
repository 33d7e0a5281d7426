use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::i18n::I18n;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown remote provider: {provider_id}")]
    UnknownProvider { provider_id: String },

    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("Database error")]
    Database(#[from] DatabaseError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors talking to an LLM provider
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Connection failed to LLM provider at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Generation failed (status {status}): {message}")]
    Generation { status: u16, message: String },

    /// The provider rejected the model's own tool-call output.
    /// `failed_generation` carries the raw text the model produced.
    #[error("Model emitted an unparseable tool call: {message}")]
    ToolSyntax {
        failed_generation: String,
        message: String,
    },

    #[error("Invalid response from LLM provider: {message}")]
    InvalidResponse { message: String },

    #[error("No LLM provider registered as '{provider}'")]
    UnknownProvider { provider: String },
}

impl LlmError {
    /// Whether this failure is the provider rejecting malformed tool-call syntax.
    pub fn is_tool_syntax(&self) -> bool {
        match self {
            LlmError::ToolSyntax { .. } => true,
            LlmError::Generation { status, message } => {
                *status == 400
                    && (message.contains("tool_use_failed")
                        || message.contains("failed_generation")
                        || message.contains("model output must contain"))
            }
            _ => false,
        }
    }

    /// Text worth scanning for a salvageable tool call
    pub fn salvage_text(&self) -> String {
        match self {
            LlmError::ToolSyntax {
                failed_generation,
                message,
            } if failed_generation.is_empty() => message.clone(),
            LlmError::ToolSyntax {
                failed_generation, ..
            } => failed_generation.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors talking to a remote capability provider
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {message}")]
    Malformed { message: String },

    #[error("Provider error {code}: {message}")]
    Protocol { code: i64, message: String },
}

/// Failure of a single capability invocation.
///
/// These never escape the dispatcher; they are rendered into a JSON payload
/// the model can read and explain.
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Unknown capability: {name}")]
    UnknownCapability { name: String },

    #[error("Invalid arguments: {message}")]
    Argument { message: String },

    #[error("{message}")]
    NotConnected { message: String },

    #[error("{message}")]
    Configuration { message: String },

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{message}")]
    Backend { message: String },
}

/// Structured error payload handed back to the model
#[derive(Debug, Serialize)]
pub struct ErrorPayload<'a> {
    pub error: String,
    pub kind: &'static str,
    pub capability: &'a str,
}

impl CapabilityError {
    pub fn argument(message: impl Into<String>) -> Self {
        CapabilityError::Argument {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        CapabilityError::Configuration {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        CapabilityError::Backend {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CapabilityError::UnknownCapability { .. } => "unknown_capability",
            CapabilityError::Argument { .. } => "invalid_arguments",
            CapabilityError::NotConnected { .. } => "not_connected",
            CapabilityError::Configuration { .. } => "configuration",
            CapabilityError::Transport(_) => "transport",
            CapabilityError::Backend { .. } => "backend",
        }
    }

    /// Render as the JSON string the model sees in place of a result
    pub fn to_payload(&self, capability: &str) -> String {
        let payload = ErrorPayload {
            error: self.to_string(),
            kind: self.kind(),
            capability,
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"capability failed","kind":"{}"}}"#,
                self.kind()
            )
        })
    }
}

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed")]
    Connection(#[source] rusqlite::Error),

    #[error("Query failed")]
    Query(#[source] rusqlite::Error),

    #[error("Serialization failed")]
    Serialization(#[source] serde_json::Error),
}

/// API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UnknownProvider { .. } => StatusCode::NOT_FOUND,
            ServiceError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Llm(LlmError::ModelNotFound { .. })
            | ServiceError::Llm(LlmError::UnknownProvider { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Llm(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::UnknownProvider { .. } => "unknown_provider",
            ServiceError::Llm(LlmError::Connection { .. }) => "llm_connection",
            ServiceError::Llm(LlmError::ModelNotFound { .. }) => "llm_model_not_found",
            ServiceError::Llm(LlmError::Generation { .. }) => "llm_generation",
            ServiceError::Llm(LlmError::ToolSyntax { .. }) => "llm_tool_syntax",
            ServiceError::Llm(LlmError::InvalidResponse { .. }) => "llm_invalid_response",
            ServiceError::Llm(LlmError::UnknownProvider { .. }) => "llm_unknown_provider",
            ServiceError::Database(_) => "database_error",
            ServiceError::InvalidRequest { .. } => "invalid_request",
            ServiceError::Config { .. } => "config_error",
            ServiceError::Internal { .. } => "internal_error",
        }
    }

    /// Get a user-friendly translated message
    pub fn user_message(&self, i18n: &I18n, locale: &str) -> String {
        match self {
            ServiceError::UnknownProvider { provider_id } => {
                i18n.format(locale, "error-unknown-provider", &[("id", provider_id)])
            }
            ServiceError::Llm(_) => i18n.get(locale, "error-llm-unavailable", None),
            ServiceError::Internal { .. } => i18n.get(locale, "error-internal", None),
            _ => self.to_string(),
        }
    }

    /// Convert to an error response with i18n support
    pub fn into_response_with_i18n(self, i18n: &I18n, locale: &str) -> Response {
        let status = self.status_code();
        let response = ErrorResponse {
            message: self.user_message(i18n, locale),
            code: Some(self.error_code().to_string()),
        };

        (status, Json(response)).into_response()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let response = ErrorResponse {
            message: self.to_string(),
            code: Some(self.error_code().to_string()),
        };

        (status, Json(response)).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error wrapper with i18n support for API responses
pub struct I18nError {
    pub error: ServiceError,
    pub i18n: std::sync::Arc<I18n>,
    pub locale: String,
}

impl I18nError {
    pub fn new(error: ServiceError, i18n: std::sync::Arc<I18n>, locale: impl Into<String>) -> Self {
        Self {
            error,
            i18n,
            locale: locale.into(),
        }
    }
}

impl IntoResponse for I18nError {
    fn into_response(self) -> Response {
        self.error.into_response_with_i18n(&self.i18n, &self.locale)
    }
}
