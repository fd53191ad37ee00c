//! Error types for agentflow

use thiserror::Error;

use crate::workflow::Generation;

/// Result type for agentflow operations
pub type Result<T> = std::result::Result<T, AgentflowError>;

/// HTTP status codes treated as transient provider failures
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Error type for agentflow operations
#[derive(Debug, Error)]
pub enum AgentflowError {
    /// Caller-fixable precondition violation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport or provider failure while calling the model
    #[error("Model invocation failed ({provider}{}): {message}", .status.map(|s| format!(", status {s}")).unwrap_or_default())]
    ModelInvocation {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// The model answered but the text could not be decoded into the requested shape
    #[error("Malformed {target} output: {message}")]
    MalformedOutput {
        target: String,
        message: String,
        raw: String,
    },

    /// The classifier selected a route outside the offered set
    #[error("Selected route '{selection}' not found in routes {available:?}")]
    RouteNotFound {
        selection: String,
        available: Vec<String>,
    },

    /// The evaluator loop hit its iteration cap without a passing verdict
    #[error("No passing solution after {iterations} iterations")]
    MaxIterationsExceeded {
        iterations: usize,
        chain_of_thought: Vec<Generation>,
    },

    /// One unit of a fan-out failed
    #[error("Failed to process input #{index}: {input}")]
    UnitFailed {
        index: usize,
        input: String,
        #[source]
        source: Box<AgentflowError>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl AgentflowError {
    /// Build a model invocation error without an HTTP status
    pub fn invocation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelInvocation {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Only provider failures qualify, and only when they carry no status
    /// (network errors, timeouts) or a status in [`RETRYABLE_STATUS_CODES`].
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ModelInvocation { status: None, .. } => true,
            Self::ModelInvocation {
                status: Some(code), ..
            } => RETRYABLE_STATUS_CODES.contains(code),
            _ => false,
        }
    }

    /// Innermost error, looking through fan-out wrappers
    pub fn root_cause(&self) -> &AgentflowError {
        match self {
            Self::UnitFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<String> for AgentflowError {
    fn from(s: String) -> Self {
        AgentflowError::Other(s)
    }
}

impl From<&str> for AgentflowError {
    fn from(s: &str) -> Self {
        AgentflowError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for AgentflowError {
    fn from(err: anyhow::Error) -> Self {
        AgentflowError::Other(err.to_string())
    }
}

impl From<figment::Error> for AgentflowError {
    fn from(err: figment::Error) -> Self {
        AgentflowError::Configuration(err.to_string())
    }
}
