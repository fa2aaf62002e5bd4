use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification shared by every failure that can reach a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    Auth,
    RateLimited,
    NotFound,
    Upstream,
    Internal,
}

impl ErrorKind {
    /// Tag placed in the `code` field of error envelopes
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_REQUEST",
            ErrorKind::Auth => "AUTH_ERROR",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Upstream | ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Class of a non-success answer from a generation provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamKind {
    Auth,
    RateLimited,
    BadRequest,
    NotFound,
    Server,
}

impl UpstreamKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => UpstreamKind::BadRequest,
            401 | 403 => UpstreamKind::Auth,
            404 => UpstreamKind::NotFound,
            429 => UpstreamKind::RateLimited,
            _ => UpstreamKind::Server,
        }
    }
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream error: {message}")]
    Upstream {
        kind: UpstreamKind,
        status: Option<u16>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        AdapterError::Upstream {
            kind: UpstreamKind::from_status(status),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Upstream answered successfully but the payload was unusable
    pub fn malformed(message: impl Into<String>) -> Self {
        AdapterError::Upstream {
            kind: UpstreamKind::Server,
            status: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::InvalidInput(_) => ErrorKind::InvalidInput,
            AdapterError::Upstream { kind, .. } => match kind {
                UpstreamKind::Auth => ErrorKind::Auth,
                UpstreamKind::RateLimited => ErrorKind::RateLimited,
                UpstreamKind::BadRequest => ErrorKind::InvalidInput,
                UpstreamKind::NotFound => ErrorKind::NotFound,
                UpstreamKind::Server => ErrorKind::Upstream,
            },
            AdapterError::Transport(_) => ErrorKind::Upstream,
            AdapterError::Io(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Workflow must have at least one step")]
    EmptyWorkflow,

    #[error("Dependency {dependency} not executed for step {step}")]
    DependencyNotExecuted { dependency: String, step: String },

    #[error("No adapter registered for step kind: {0}")]
    UnknownStepKind(String),

    #[error("Step {step} failed: {source}")]
    Step {
        step: String,
        #[source]
        source: AdapterError,
    },

    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("Task join error: {0}")]
    Join(String),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::EmptyWorkflow => ErrorKind::InvalidInput,
            WorkflowError::DependencyNotExecuted { .. } => ErrorKind::InvalidInput,
            WorkflowError::UnknownStepKind(_) => ErrorKind::InvalidInput,
            WorkflowError::Step { source, .. } => source.kind(),
            WorkflowError::ExecutionNotFound(_) => ErrorKind::NotFound,
            WorkflowError::Join(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Adapter(e) => e.kind(),
            GatewayError::Workflow(e) => e.kind(),
            GatewayError::Io(_) => ErrorKind::Internal,
        }
    }
}
