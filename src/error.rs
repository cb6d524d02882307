//! Error types for table building.
//!
//! Only structural misuse is surfaced as a `CrunchError`. Faults met
//! while resolving paths or evaluating expressions are absorbed into a
//! guarded zero and reported through [`crate::diagnostics`] instead.

use thiserror::Error;

/// Errors returned to the caller.
///
/// # Examples
///
/// ```rust
/// use statcrunch::CrunchError;
///
/// let err = CrunchError::MissingKeys;
/// println!("{}", err); // "Configuration error: keys are required"
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CrunchError {
    /// No keys were configured for the table.
    #[error("Configuration error: keys are required")]
    MissingKeys,

    /// Row differencing and string formatting were both requested.
    ///
    /// A formatted cell is text, so there is nothing left to subtract.
    #[error("Configuration error: delta and str_fmt are mutually exclusive")]
    DeltaWithFormat,

    /// A `date` column was requested but a row has no timestamp.
    #[error("Configuration error: row {row} has no timestamp for the date column")]
    MissingTimestamp { row: usize },

    /// The `date_fmt` pattern could not be parsed.
    #[error("Configuration error: invalid date format {0:?}")]
    InvalidDateFormat(String),

    /// The `str_fmt` pattern could not be parsed.
    #[error("Configuration error: invalid value format {0:?}")]
    InvalidFormat(String),

    /// A reducer name did not match any known reducer.
    #[error("Configuration error: unknown list operator {0:?}")]
    UnknownReducer(String),

    /// A serialized configuration could not be decoded.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// A read-only record was mutated.
    #[error("Record is read-only")]
    ReadOnly,
}

impl CrunchError {
    /// Whether this error belongs to the configuration error class.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, CrunchError::ReadOnly)
    }
}
