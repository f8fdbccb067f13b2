//! Error types for directory operations.
//!
//! Every failure that comes back from a directory round trip carries the operation, the target
//! DN and the raw LDAP result code, so callers can act on it without re-querying the server.

use thiserror::Error;

/// The single change of a modify request that the server rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedChange {
    /// Position of the change in the submitted change-list.
    pub index: usize,
    /// Change kind (`delete`, `replace` or `add`).
    pub operation: String,
    /// Attribute targeted by the change.
    pub attribute: String,
}

/// Main error type for directory operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bind was refused by the server
    #[error("Authentication failed for {identity}: {message}")]
    Authentication {
        /// Bind identity (empty for anonymous binds)
        identity: String,
        /// Server or client diagnostic
        message: String,
    },

    /// Directory server could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Base DN could not be derived from the bound identity
    #[error("Cannot infer base DN: {0}")]
    Inference(String),

    /// A template references a placeholder nobody supplied
    #[error("Unresolved placeholder: {token}")]
    UnresolvedPlaceholder {
        /// The offending uppercase token
        token: String,
    },

    /// A modify request was rejected by the server
    #[error("Modify of {dn} rejected ({code}): {message}")]
    ChangeRejected {
        /// Entry being modified
        dn: String,
        /// LDAP result code
        code: u32,
        /// Server diagnostic message
        message: String,
        /// The change the diagnostic points at, when it can be identified
        rejected: Option<RejectedChange>,
    },

    /// Any other operation completed with a non-success result code
    #[error("{operation} of {dn} failed ({code}): {message}")]
    Protocol {
        /// Operation name (`search`, `add`, `delete`, ...)
        operation: String,
        /// Target DN
        dn: String,
        /// LDAP result code
        code: u32,
        /// Server diagnostic message
        message: String,
    },

    /// Transport failure while an operation was in flight
    #[error("Transport error during {operation}: {message}")]
    Transport {
        /// Operation name
        operation: String,
        /// Client library diagnostic
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed distinguished name
    #[error("Invalid DN: {0}")]
    InvalidDn(String),

    /// An attribute value could not be interpreted
    #[error("Invalid value for {attribute}: {message}")]
    InvalidValue {
        /// Attribute that held the value
        attribute: String,
        /// What was wrong with it
        message: String,
    },

    /// Entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "AUTHENTICATION_FAILED",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Inference(_) => "INFERENCE_FAILED",
            Self::UnresolvedPlaceholder { .. } => "UNRESOLVED_PLACEHOLDER",
            Self::ChangeRejected { .. } => "CHANGE_REJECTED",
            Self::Protocol { .. } => "PROTOCOL_ERROR",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidDn(_) => "INVALID_DN",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Timeout(_) => "TIMEOUT",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Raw LDAP result code carried by the error, if the server produced one.
    #[must_use]
    pub const fn result_code(&self) -> Option<u32> {
        match self {
            Self::ChangeRejected { code, .. } | Self::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true for failures that end the session before any operation ran.
    #[must_use]
    pub const fn is_bind_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::ServiceUnavailable(_)
        )
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::Transport { .. } | Self::ServiceUnavailable(_)
        )
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
