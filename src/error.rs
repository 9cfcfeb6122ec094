//! Error types for signing, transport and the task lifecycle.

use std::fmt;
use thiserror::Error;

/// The error type for all client operations.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials are missing or empty
    CredentialInvalid,

    /// Request cannot be built or signed (invalid header values, etc.)
    RequestInvalid,

    /// Transport-level failure: connection refused, DNS failure, timeout
    /// or a generic network fault. The only retryable kind.
    Transport,

    /// Non-2xx HTTP status, or a response body that is not valid JSON
    Protocol,

    /// The service reported an application error (`code != 10000`)
    Api,

    /// The service reported success but the envelope violates the
    /// contract (missing `task_id`/`status`, unknown status value)
    MalformedResponse,

    /// The queried task does not exist
    TaskNotFound,

    /// The queried task's result fell out of the retention window
    TaskExpired,

    /// The task reached `done` but generation failed or produced no output
    TaskFailed,

    /// The polling budget elapsed without a terminal state
    PollTimeout,
}

impl Error {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether this failure is worth retrying within the polling budget.
    ///
    /// Only transport faults qualify; protocol, application and lifecycle
    /// failures always abort the call.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    /// Prefix the message with the operation that was in progress, so
    /// failures are traceable to the phase that produced them.
    pub fn context(mut self, operation: &str) -> Self {
        self.message = format!("{operation}: {}", self.message);
        self
    }
}

// Convenience constructors
impl Error {
    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Create a remote application error
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }

    /// Create a malformed response error
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    /// Create a task not found error
    pub fn task_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TaskNotFound, message)
    }

    /// Create a task expired error
    pub fn task_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TaskExpired, message)
    }

    /// Create a task failed error
    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TaskFailed, message)
    }

    /// Create a poll timeout error
    pub fn poll_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PollTimeout, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::Protocol => write!(f, "protocol error"),
            ErrorKind::Api => write!(f, "remote application error"),
            ErrorKind::MalformedResponse => write!(f, "malformed response"),
            ErrorKind::TaskNotFound => write!(f, "task not found"),
            ErrorKind::TaskExpired => write!(f, "task expired"),
            ErrorKind::TaskFailed => write!(f, "task failed"),
            ErrorKind::PollTimeout => write!(f, "poll timeout"),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
