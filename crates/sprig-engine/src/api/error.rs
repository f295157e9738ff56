// api/error.rs
//
// Configuration-time errors for the whole engine.

use crate::api::types::NodeId;

/// Convenience result type used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Configuration-time failures. Nothing in the per-frame path returns one of
/// these: `Action::step` reports state through `ActionStatus` instead.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Interpolator descriptor names a curve family that does not exist.
    #[error("unknown interpolator type '{0}'")]
    UnknownInterpolatorType(String),

    /// Action initializer names an action kind that does not exist.
    #[error("unknown action type '{0}'")]
    UnknownActionType(String),

    /// Zero, negative or non-finite duration, or a negative/non-finite delay.
    #[error("invalid {field}: {value}")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("invalid speed: {0}")]
    InvalidSpeed(f64),

    /// A finite repeat count of zero.
    #[error("repeat count must be at least 1")]
    InvalidRepeatCount,

    #[error("sequence has no children")]
    EmptySequence,

    /// Sequences need every child to end so the next one can start.
    #[error("infinitely repeating action cannot be placed inside a sequence")]
    UnboundedSequenceChild,

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{0} does not exist")]
    UnknownNode(NodeId),

    #[error("{0} already exists")]
    DuplicateNode(NodeId),

    #[error("{child} cannot be attached under its own descendant {parent}")]
    HierarchyCycle { child: NodeId, parent: NodeId },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue { field, reason: reason.into() }
    }
}
