use thiserror::Error;

use crate::Operation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid test event: {0}")]
    InvalidEvent(String),

    #[error("Function '{0}' is not deployed yet; deploy it before invoking")]
    FunctionNotFound(String),

    #[error("Function lookup failed: {0}")]
    Lookup(String),

    #[error("Deploy failed: {0}")]
    Deploy(String),

    #[error("Invocation failed: {0}")]
    Invocation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Runtime catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("A {0} is already in progress")]
    OperationInProgress(Operation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    InvalidEvent,
    FunctionNotFound,
    Lookup,
    Deploy,
    Invocation,
    Transport,
    CatalogUnavailable,
    OperationInProgress,
}

impl ConsoleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsoleError::Validation(_) => ErrorKind::Validation,
            ConsoleError::InvalidEvent(_) => ErrorKind::InvalidEvent,
            ConsoleError::FunctionNotFound(_) => ErrorKind::FunctionNotFound,
            ConsoleError::Lookup(_) => ErrorKind::Lookup,
            ConsoleError::Deploy(_) => ErrorKind::Deploy,
            ConsoleError::Invocation(_) => ErrorKind::Invocation,
            ConsoleError::Transport(_) => ErrorKind::Transport,
            ConsoleError::CatalogUnavailable(_) => ErrorKind::CatalogUnavailable,
            ConsoleError::OperationInProgress(_) => ErrorKind::OperationInProgress,
        }
    }

    /// The bare message without the category prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            ConsoleError::Validation(msg)
            | ConsoleError::InvalidEvent(msg)
            | ConsoleError::Lookup(msg)
            | ConsoleError::Deploy(msg)
            | ConsoleError::Invocation(msg)
            | ConsoleError::Transport(msg)
            | ConsoleError::CatalogUnavailable(msg) => msg.clone(),
            ConsoleError::FunctionNotFound(_) | ConsoleError::OperationInProgress(_) => {
                self.to_string()
            }
        }
    }

    /// Whether the failure happened before any request left the client.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            ConsoleError::Validation(_)
                | ConsoleError::InvalidEvent(_)
                | ConsoleError::OperationInProgress(_)
        )
    }
}
