//! Error types for the Event Source Agent
//!
//! One taxonomy for the whole pipeline. Every variant maps to the
//! `retCode`/`description` pair reported back to the caller.

use thiserror::Error;

use crate::contracts::ServiceResponse;

/// Envelope or per-tag field problems. Raised before any remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Message body could not be parsed at all
    #[error("body is not valid JSON: {0}")]
    MalformedJson(String),

    /// Message body is not a JSON object
    #[error("message must be an object")]
    NotAnObject,

    /// A required property is absent (or null)
    #[error("{path} is required")]
    Missing { path: String },

    /// A property has the wrong JSON type
    #[error("{path} must be {expected}")]
    InvalidType { path: String, expected: &'static str },

    /// `eventTag` is not in the registry
    #[error("{path} is not a registered event tag: {value}")]
    NotRegistered { path: String, value: String },
}

impl ValidationError {
    pub fn missing(path: impl Into<String>) -> Self {
        ValidationError::Missing { path: path.into() }
    }

    pub fn invalid_type(path: impl Into<String>, expected: &'static str) -> Self {
        ValidationError::InvalidType {
            path: path.into(),
            expected,
        }
    }
}

/// Pipeline error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventSourceError {
    /// Malformed envelope; no remote call was made
    #[error("Invalid message: {0}")]
    Validation(#[from] ValidationError),

    /// Directory answered successfully but held no record for the uuid
    #[error("device not found: {uuid}")]
    NotFound { uuid: String },

    /// A collaborator answered with a non-success retCode
    #[error("{description}")]
    Remote { code: i64, description: String },

    /// A collaborator could not be reached or its reply could not be read
    #[error("transport error: {0}")]
    Transport(String),
}

impl EventSourceError {
    pub const VALIDATION_CODE: i64 = 400;
    pub const NOT_FOUND_CODE: i64 = 404;
    pub const TRANSPORT_CODE: i64 = 503;

    /// Create a remote error carrying the collaborator's code verbatim
    pub fn remote(code: i64, description: impl Into<String>) -> Self {
        EventSourceError::Remote {
            code,
            description: description.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        EventSourceError::Transport(msg.into())
    }

    /// Caller-facing return code
    pub fn ret_code(&self) -> i64 {
        match self {
            EventSourceError::Validation(_) => Self::VALIDATION_CODE,
            EventSourceError::NotFound { .. } => Self::NOT_FOUND_CODE,
            EventSourceError::Remote { code, .. } => *code,
            EventSourceError::Transport(_) => Self::TRANSPORT_CODE,
        }
    }

    /// Check if the caller sent something we could not accept
    pub fn is_user_error(&self) -> bool {
        matches!(self, EventSourceError::Validation(_))
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            EventSourceError::Validation(_) => "validation",
            EventSourceError::NotFound { .. } => "not_found",
            EventSourceError::Remote { .. } => "remote",
            EventSourceError::Transport(_) => "transport",
        }
    }
}

impl From<&EventSourceError> for ServiceResponse {
    fn from(err: &EventSourceError) -> Self {
        ServiceResponse::failure(err.ret_code(), err.to_string())
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EventSourceError>;
