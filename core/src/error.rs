use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The error type for runpkg operations
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An upstream resource or derived value failed to resolve
    ResolutionFailed,

    /// A data-plane call (SAS or key listing) failed
    DataPlaneFailed,

    /// A derived value was constructed from malformed inputs
    CompositionInvalid,

    /// Credentials are missing, invalid or expired
    CredentialInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors (network, I/O, serialization, etc.)
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Recover an owned error from one shared between the consumers of a derived value.
    ///
    /// The kind and message are kept so that callers can still branch on them.
    pub fn from_shared(err: Arc<Error>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(|err| {
            Error::new(err.kind, err.message.clone()).with_source(err)
        })
    }
}

// Convenience constructors
impl Error {
    /// Create a resolution failed error
    pub fn resolution_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResolutionFailed, message)
    }

    /// Create a data plane failed error
    pub fn data_plane_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataPlaneFailed, message)
    }

    /// Create a composition invalid error
    pub fn composition_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CompositionInvalid, message)
    }

    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ResolutionFailed => write!(f, "resolution failed"),
            ErrorKind::DataPlaneFailed => write!(f, "data plane call failed"),
            ErrorKind::CompositionInvalid => write!(f, "invalid composition"),
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
