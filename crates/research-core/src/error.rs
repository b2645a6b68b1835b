//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Fatal configuration error (missing credential, bad provider name).
    /// Raised at construction time, never during a run.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Single failed provider invocation (network/API)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider retry ceiling exhausted; carries the last error
    #[error("Provider '{provider}' failed after {attempts} attempts: {last_error}")]
    ProviderExhausted {
        provider: String,
        attempts: u32,
        last_error: String,
    },

    /// Requested tool name absent from the registry
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// Tool returned something other than a list of search results
    #[error("Tool '{tool}' returned an invalid result shape: {detail}")]
    ToolOutputSchema { tool: String, detail: String },

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Failure while assembling the final research summary
    #[error("Finalization error: {0}")]
    Finalization(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Whether a failed provider call is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Provider(_) | AgentError::Io(_))
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
