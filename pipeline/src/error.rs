//! Error types for pipeline operations.

/// Error type for pipeline operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Errors from an underlying store or pipeline stage.
    Store(store::Error),

    /// Key encoding or decoding errors.
    Encoding(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Store(e) => write!(f, "Store error: {}", e),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
        }
    }
}

impl From<store::Error> for Error {
    fn from(e: store::Error) -> Self {
        Error::Store(e)
    }
}

impl From<lexkey::Error> for Error {
    fn from(e: lexkey::Error) -> Self {
        match e {
            lexkey::Error::Encoding(msg) => Error::Encoding(msg),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
