//! Diagnostics for the evaluation path.
//!
//! Resolution and evaluation never fail. When something goes wrong the
//! caller still gets a guarded zero, and a [`Fault`] describing what
//! happened is handed to a [`DiagnosticSink`].

use thiserror::Error;

/// A fault absorbed during resolution or evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Fault {
    /// A key or path segment does not exist.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// A key resolved to a value that is neither a number nor a mapping.
    #[error("key {key} does not hold a number or mapping")]
    Unsupported { key: String },

    /// An intermediate path segment is not a mapping.
    #[error("segment {segment} of {key} is not a mapping")]
    NotAMapping { key: String, segment: String },

    /// An operand resolved to a mapping where a number was needed.
    #[error("operand {operand} in {expr:?} is not a number")]
    NotANumber { expr: String, operand: String },

    /// The operator token is not one of `+ - * / x :`.
    #[error("unknown operator {op:?} in {expr:?}")]
    UnknownOperator { expr: String, op: String },

    /// The expression does not split into exactly three tokens.
    #[error("malformed expression {expr:?}")]
    MalformedExpression { expr: String },

    /// A division by zero was attempted.
    #[error("division by zero in {expr:?}")]
    DivisionByZero { expr: String },

    /// The arithmetic produced NaN or an infinity.
    #[error("non-finite result in {expr:?}")]
    NonFinite { expr: String },
}

impl Fault {
    /// Whether this fault is a missing-value fault rather than a compute fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Fault::NotFound { .. } | Fault::Unsupported { .. } | Fault::NotAMapping { .. }
        )
    }

    /// The key for missing-value faults, the expression for compute faults.
    pub fn subject(&self) -> &str {
        match self {
            Fault::NotFound { key }
            | Fault::Unsupported { key }
            | Fault::NotAMapping { key, .. } => key,
            Fault::NotANumber { expr, .. }
            | Fault::UnknownOperator { expr, .. }
            | Fault::MalformedExpression { expr }
            | Fault::DivisionByZero { expr }
            | Fault::NonFinite { expr } => expr,
        }
    }
}

/// Receiver for absorbed faults.
///
/// # Examples
///
/// ```rust
/// use statcrunch::diagnostics::{DiagnosticSink, Fault};
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<Fault>>);
///
/// impl DiagnosticSink for Recorder {
///     fn report(&self, fault: Fault) {
///         self.0.lock().unwrap().push(fault);
///     }
/// }
/// ```
pub trait DiagnosticSink: Send + Sync {
    /// Record a fault.
    fn report(&self, fault: Fault);
}

/// Sink that forwards faults to `tracing`.
///
/// Missing values are logged at `debug` with a `key` field, compute
/// faults at `warn` with an `expr` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, fault: Fault) {
        if fault.is_not_found() {
            tracing::debug!(key = fault.subject(), %fault, "value not found");
        } else {
            tracing::warn!(expr = fault.subject(), %fault, "computation fault absorbed");
        }
    }
}

/// Sink that discards every fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _fault: Fault) {}
}
