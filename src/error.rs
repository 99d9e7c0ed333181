//! Error types for the trigger runtime.
//!
//! Every fallible operation returns [`Result`]. Errors raised inside a
//! dispatch loop are isolated per subscriber: the loop logs them, records
//! them in the [`DispatchReport`](crate::events::DispatchReport) and keeps
//! delivering to the remaining subscribers.

use thiserror::Error;

use crate::core::{ActionId, HandlerId};

/// Result alias used across the crate.
pub type Result<T, E = TriggerError> = std::result::Result<T, E>;

/// How an error should be treated by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// The operation was refused; retrying later (or after configuration)
    /// may succeed.
    Recoverable,
    /// Bad input or configuration; retrying unchanged will fail again.
    Validation,
    /// The runtime was asked about an object it does not own.
    Internal,
}

/// Errors produced by the runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriggerError {
    /// An operation was given the sentinel invalid event identifier.
    #[error("invalid event identifier")]
    InvalidIdentifier,

    /// A handler was initialized with an unusable configuration.
    #[error("invalid handler configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// A condition's selector names no comparer in its registry, or is unset.
    #[error("invalid comparer type: {}", .selector.as_deref().unwrap_or("<unset>"))]
    InvalidComparerType { selector: Option<String> },

    /// The target's current state forbids the requested operation.
    #[error("cannot {operation} {target} while {state}")]
    InvalidState {
        target: String,
        state: String,
        operation: &'static str,
    },

    /// The target is already executing further up the call stack.
    #[error("{target} is already executing a hook")]
    Reentrant { target: String },

    /// No factory is registered for the requested action kind.
    #[error("unknown action kind '{0}'")]
    UnknownActionKind(String),

    /// The handler id does not refer to a live handler.
    #[error("unknown handler {0}")]
    UnknownHandler(HandlerId),

    /// The action id does not refer to a live action.
    #[error("unknown action {0}")]
    UnknownAction(ActionId),

    /// Encoding or decoding an exported record failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A runtime configuration document was rejected.
    #[error("invalid runtime configuration: {0}")]
    Config(String),
}

impl TriggerError {
    /// Shorthand for an [`TriggerError::InvalidState`] error.
    pub(crate) fn invalid_state(
        target: impl std::fmt::Display,
        state: impl std::fmt::Debug,
        operation: &'static str,
    ) -> Self {
        Self::InvalidState {
            target: target.to_string(),
            state: format!("{state:?}"),
            operation,
        }
    }

    /// Classify this error for recovery decisions.
    #[must_use]
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidState { .. } | Self::Reentrant { .. } | Self::InvalidComparerType { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::InvalidIdentifier
            | Self::InvalidConfiguration { .. }
            | Self::UnknownActionKind(_)
            | Self::Serialization(_)
            | Self::Config(_) => ErrorSeverity::Validation,
            Self::UnknownHandler(_) | Self::UnknownAction(_) => ErrorSeverity::Internal,
        }
    }
}

impl From<bincode::Error> for TriggerError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for TriggerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
