use std::path::PathBuf;

use thiserror::Error;

use crate::graph::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    RouteNotFound,
    NotFound,
    PropertyNotFound,
    InvalidRequest,
    MissingParameter,
    InvalidType,
    InvalidRange,
    InvalidEnumValue,
    ActionNotAvailable,
    PreconditionViolation,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::RouteNotFound
            | Self::NotFound
            | Self::PropertyNotFound
            | Self::ActionNotAvailable => 404,
            Self::InvalidRequest
            | Self::MissingParameter
            | Self::InvalidType
            | Self::InvalidRange
            | Self::InvalidEnumValue
            | Self::PreconditionViolation => 400,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RouteNotFound => "route_not_found",
            Self::NotFound => "not_found",
            Self::PropertyNotFound => "property_not_found",
            Self::InvalidRequest => "invalid_request",
            Self::MissingParameter => "missing_parameter",
            Self::InvalidType => "invalid_type",
            Self::InvalidRange => "invalid_range",
            Self::InvalidEnumValue => "invalid_enum_value",
            Self::ActionNotAvailable => "action_not_available",
            Self::PreconditionViolation => "precondition_violation",
            Self::Internal => "internal",
        }
    }
}

/// Errors surfaced by property reads, action dispatch and discovery.
///
/// The `Display` text is the caller-facing message, except for
/// `InternalError` whose detail is only logged (see [`DispatchError::public_message`]).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    RouteNotFound(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Property '{0}' not found")]
    PropertyNotFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
    #[error("{message}")]
    InvalidType { parameter: String, message: String },
    #[error("{message}")]
    InvalidRange { parameter: String, message: String },
    #[error("{message}")]
    InvalidEnumValue { parameter: String, message: String },
    #[error("Action '{0}' is not available on this device instance")]
    ActionNotAvailable(String),
    #[error("{0}")]
    PreconditionViolation(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl DispatchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RouteNotFound(_) => ErrorCode::RouteNotFound,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::PropertyNotFound(_) => ErrorCode::PropertyNotFound,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::MissingParameter(_) => ErrorCode::MissingParameter,
            Self::InvalidType { .. } => ErrorCode::InvalidType,
            Self::InvalidRange { .. } => ErrorCode::InvalidRange,
            Self::InvalidEnumValue { .. } => ErrorCode::InvalidEnumValue,
            Self::ActionNotAvailable(_) => ErrorCode::ActionNotAvailable,
            Self::PreconditionViolation(_) => ErrorCode::PreconditionViolation,
            Self::InternalError(_) => ErrorCode::Internal,
        }
    }

    pub fn status(&self) -> u16 {
        self.code().http_status()
    }

    /// Message safe to hand to a remote caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Offending parameter, for validation failures.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::MissingParameter(p) => Some(p),
            Self::InvalidType { parameter, .. }
            | Self::InvalidRange { parameter, .. }
            | Self::InvalidEnumValue { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

/// Errors raised while building a simulator from TD documents and snapshots.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("graph error in {path}: {source}")]
    Graph {
        path: PathBuf,
        #[source]
        source: GraphError,
    },
    #[error("device kind '{kind}' has no handler for action '{action}' (artifact {artifact})")]
    MissingHandler {
        kind: String,
        action: String,
        artifact: String,
    },
    #[error("invalid state snapshot: {0}")]
    InvalidState(String),
    #[error("nothing to load: {0}")]
    Empty(String),
}
