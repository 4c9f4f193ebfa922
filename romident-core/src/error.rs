use thiserror::Error;

/// Errors that can occur while identifying a file.
#[derive(Debug, Error)]
pub enum IdentError {
    /// I/O error from the underlying reader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Magic/fixed-byte mismatch or required field absent. Parser-local:
    /// the dispatcher suppresses this and tries the next candidate.
    #[error("invalid format: {0}")]
    Invalid(String),

    /// Structural inconsistency found after a successful magic check
    /// (CRC mismatch, offset out of bounds). Fatal for the current file.
    #[error("corrupt file: {0}")]
    Corrupt(String),

    /// Known but unhandled variant.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Caller passed a bad argument (missing path, empty archive).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl IdentError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for the parser-local rejection kind the dispatcher may swallow.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}
