//! Error types for store operations.

/// Error type for store operations.
///
/// Only environmental failures are represented here. Contract violations
/// (double-begin of a session, seeking outside a read session) are
/// programming errors and panic instead. End-of-stream is not an error;
/// readers signal it with `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Errors surfaced by the underlying storage engine.
    Engine(String),

    /// Internal errors indicating bugs or invariant violations.
    Internal(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Engine(msg) => write!(f, "Engine error: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl Error {
    /// Converts an engine-level error to `Error::Engine`.
    pub fn from_engine(e: impl std::fmt::Display) -> Self {
        Error::Engine(e.to_string())
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
