//! services/superbrain/src/error.rs
//!
//! Defines the primary error type for the superbrain service.

use crate::config::ConfigError;
use student_hub_core::ports::PortError;

/// The primary error type for the `superbrain` service.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A user turn was submitted while another turn was awaiting its response.
    #[error("A turn is already awaiting a response for this session")]
    TurnInFlight,

    /// A user turn was submitted to (or resolved against) a closed session.
    #[error("The chat session is closed")]
    SessionClosed,

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
