//! # statcrunch - Numeric Reports from Nested Records
//!
//! Extracts numbers from nested, path-addressable records, evaluates
//! small arithmetic expressions over those paths, and assembles the
//! results into tables with optional statistical reduction, rounding,
//! formatting and row-to-row differencing.
//!
//! ## Core Concepts
//!
//! ### Pipeline
//!
//! ```text
//! [Input] → [Aggregator] → [PathResolver / Expression] → [NumericGuard] → [Table]
//! ```
//!
//! 1. **Records** expose a JSON payload and an optional timestamp
//! 2. **Paths** (`"loans/requested/GBP"`) address nested values
//! 3. **Expressions** (`"(keys - doors) * 2"`) combine paths and literals
//! 4. **Periods** of records are reduced to one row with a [`ReducerKind`]
//! 5. **Tables** hold one row per input, cells in key order
//!
//! ### Key Features
//!
//! - **Total evaluation**: missing data and arithmetic faults become `0.0`
//! - **Observable faults**: absorbed faults go to a [`DiagnosticSink`]
//! - **Configuration errors**: only invalid [`TableConfig`]s are rejected
//!
//! ## Example
//!
//! ```rust
//! use statcrunch::*;
//! use serde_json::json;
//!
//! let list = vec![
//!     Input::Single(json!({ "doors": 10, "keys": 8 })),
//!     Input::Single(json!({ "doors": 12, "keys": 15 })),
//! ];
//!
//! let config = TableConfig::new(["doors", "keys - doors"]).delta(true);
//! let table = as_table(&list, &config).unwrap();
//!
//! assert_eq!(table.rows[0], vec![Cell::Number(10.0), Cell::Number(-2.0)]);
//! assert_eq!(table.rows[1], vec![Cell::Number(2.0), Cell::Number(5.0)]);
//! ```
//!
//! ## Modules
//!
//! - [`record`] - Record capability and record-level delta
//! - [`path`] - Path resolution
//! - [`expr`] - Expression evaluation
//! - [`reduce`] - Statistical reducers
//! - [`aggregate`] - Period flattening
//! - [`table`] - Table building
//! - [`format`] - Value format patterns
//! - [`numeric`] - Numeric guard
//! - [`diagnostics`] - Absorbed faults and sinks
//! - [`error`] - Error types

pub mod aggregate;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod format;
pub mod numeric;
pub mod path;
pub mod record;
pub mod reduce;
pub mod table;

// Re-export main types for convenience
pub use diagnostics::{DiagnosticSink, Fault, NullSink, TracingSink};
pub use error::CrunchError;
pub use record::{record_delta, DataRecord, Record};
pub use reduce::ReducerKind;
pub use table::{as_table, Cell, Input, Rounding, Table, TableBuilder, TableConfig};

// Re-export the evaluation entry points
pub use expr::{evaluate, Operator};
pub use numeric::checked;
pub use path::{resolve, Resolved};
