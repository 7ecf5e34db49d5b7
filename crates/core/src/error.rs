//! Error types for statement building and execution.
//!
//! All errors surfaced by the fluent API are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant carries the failing function and typed details
//! - **Serializable**: Can be converted to/from JSON for script bindings
//! - **Opaque for collaborators**: Session failures pass through unchanged
//!
//! # Categories
//!
//! | Category | Variants | Detected at |
//! |----------|----------|-------------|
//! | Arguments | `ArgumentCount`, `TypeMismatch`, `InvalidArgument`, `Syntax` | call time |
//! | State | `IllegalState` | call time |
//! | Binding | `MissingBinding` | execute time |
//! | Result | `Unsupported` | accessor call |
//! | Collaborator | `Session` | execute time |
//! | Configuration | `Config` | load time |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for fluentdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error reported by a session collaborator.
///
/// The dispatcher forwards these verbatim; codes follow the server's
/// numbering where one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct SessionError {
    /// Collaborator error code
    pub code: u32,
    /// Human-readable message
    pub message: String,
}

impl SessionError {
    /// Create a new collaborator error
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Statement errors.
///
/// `function` names the failing call the way scripts see it, for example
/// `TableUpdate.set` or `CollectionFind.execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum Error {
    // ==================== Argument Errors ====================
    /// Wrong number of arguments
    #[error("Invalid number of arguments in {function}, expected {expected} but got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Argument of the wrong type
    #[error("{function}: Argument #{position} is expected to be {expected}")]
    TypeMismatch {
        function: String,
        position: usize,
        expected: String,
    },

    /// Argument has the right type but an unacceptable value
    #[error("{function}: {reason}")]
    InvalidArgument { function: String, reason: String },

    /// Malformed criteria or expression text
    #[error("{function}: {reason}")]
    Syntax { function: String, reason: String },

    // ==================== State Errors ====================
    /// Call not permitted in the statement's current stage
    #[error("{function}: {reason}")]
    IllegalState { function: String, reason: String },

    // ==================== Binding Errors ====================
    /// Placeholders left unbound at execute
    #[error(
        "{function}: Missing value bindings for the next placeholders: {}",
        .placeholders.join(", ")
    )]
    MissingBinding {
        function: String,
        placeholders: Vec<String>,
    },

    // ==================== Result Errors ====================
    /// Accessor not applicable to this result
    #[error("{function}: {reason}")]
    Unsupported { function: String, reason: String },

    // ==================== Collaborator Errors ====================
    /// Failure reported by the session collaborator
    #[error(transparent)]
    Session(#[from] SessionError),

    // ==================== Configuration Errors ====================
    /// Configuration could not be read or parsed
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl Error {
    /// Arity violation.
    pub fn argument_count(
        function: impl Into<String>,
        expected: impl ToString,
        actual: usize,
    ) -> Self {
        Error::ArgumentCount {
            function: function.into(),
            expected: expected.to_string(),
            actual,
        }
    }

    /// Argument `position` (1-based) has the wrong type.
    pub fn type_mismatch(
        function: impl Into<String>,
        position: usize,
        expected: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            function: function.into(),
            position,
            expected: expected.into(),
        }
    }

    /// Argument value rejected.
    pub fn invalid_argument(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Malformed text.
    pub fn syntax(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Syntax {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Call out of stage.
    pub fn illegal_state(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::IllegalState {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Unavailable accessor.
    pub fn unsupported(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Unsupported {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Configuration failure.
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    /// Rewrite the function name, keeping the details.
    ///
    /// Used when a shared validation helper fails on behalf of a specific
    /// statement method.
    pub fn in_function(self, name: &str) -> Self {
        match self {
            Error::ArgumentCount {
                expected, actual, ..
            } => Error::ArgumentCount {
                function: name.to_string(),
                expected,
                actual,
            },
            Error::TypeMismatch {
                position, expected, ..
            } => Error::TypeMismatch {
                function: name.to_string(),
                position,
                expected,
            },
            Error::InvalidArgument { reason, .. } => Error::invalid_argument(name, reason),
            Error::Syntax { reason, .. } => Error::syntax(name, reason),
            Error::IllegalState { reason, .. } => Error::illegal_state(name, reason),
            Error::MissingBinding { placeholders, .. } => Error::MissingBinding {
                function: name.to_string(),
                placeholders,
            },
            Error::Unsupported { reason, .. } => Error::unsupported(name, reason),
            other => other,
        }
    }

    /// Function name carried by the error, if any.
    pub fn function(&self) -> Option<&str> {
        match self {
            Error::ArgumentCount { function, .. }
            | Error::TypeMismatch { function, .. }
            | Error::InvalidArgument { function, .. }
            | Error::Syntax { function, .. }
            | Error::IllegalState { function, .. }
            | Error::MissingBinding { function, .. }
            | Error::Unsupported { function, .. } => Some(function),
            Error::Session(_) | Error::Config { .. } => None,
        }
    }
}
