//! Error types for the actionstage domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

use crate::action::ActionKind;

/// The top-level error type for all actionstage operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Proposal store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Capability adapter errors ---
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    // --- Dispatcher errors ---
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    // --- Request validation ---
    #[error("Validation error: {0}")]
    Validation(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the language model.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Action not found: {0}")]
    NotFound(String),

    #[error("Payload kind mismatch: action is '{expected}', replacement is '{found}'")]
    KindMismatch {
        expected: ActionKind,
        found: ActionKind,
    },

    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Failures reported by a capability adapter's remote service.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("{service} is not configured: {reason}")]
    NotConfigured { service: String, reason: String },

    #[error("{service} API returned {status}: {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    #[error("{service} request failed: {reason}")]
    Network { service: String, reason: String },

    #[error("Invalid payload for {service}: {reason}")]
    InvalidPayload { service: String, reason: String },
}

impl AdapterError {
    pub fn network(service: &str, reason: impl std::fmt::Display) -> Self {
        Self::Network {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_payload(service: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// The HTTP status carried by an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A dispatched Action whose adapter call failed.
#[derive(Debug, Clone, Error)]
#[error("{kind} failed: {message}")]
pub struct ExecutionError {
    pub kind: ActionKind,
    pub message: String,
}
