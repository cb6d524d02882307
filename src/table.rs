//! Table building module.
//!
//! Provides [`TableBuilder`], the main entry point. A table is built from
//! a list of inputs, each either a single record or a period of records,
//! and a [`TableConfig`] naming the keys (paths or expressions) that
//! become the columns.
//!
//! ```text
//! [Input] → (flatten period) → fetch key → round → format → guard → [row]
//!                                                           ↓
//!                                       (optional) difference against previous raw row
//! ```

use crate::aggregate::{flatten, DATE_KEY};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::CrunchError;
use crate::format::ValueFormat;
use crate::numeric::{checked, ZERO};
use crate::path::fetch_number;
use crate::record::Record;
use crate::reduce::ReducerKind;
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options for building a table.
///
/// Can be built in code or decoded from JSON.
///
/// # Examples
///
/// ```rust
/// use statcrunch::{ReducerKind, TableConfig};
///
/// let config = TableConfig::new(["date", "dogs", "cats - dogs"])
///     .list_operator(ReducerKind::Sum)
///     .round(2);
///
/// let parsed = TableConfig::from_json(
///     r#"{ "keys": ["date", "dogs", "cats - dogs"], "list_operator": "sum", "round": 2 }"#,
/// )
/// .unwrap();
/// assert_eq!(config, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Column keys, each a path or an expression. `date` selects the timestamp.
    pub keys: Vec<String>,
    /// Reducer used when an input is a period of records.
    pub list_operator: ReducerKind,
    /// strftime pattern for the `date` column.
    pub date_fmt: Option<String>,
    /// printf-style pattern applied to every value cell.
    pub str_fmt: Option<String>,
    /// Decimal places to round to; `0` rounds to an integer.
    pub round: Option<i32>,
    /// Replace each row by its difference from the previous row.
    pub delta: bool,
}

impl TableConfig {
    /// Create a configuration for the given keys.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Decode a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, CrunchError> {
        serde_json::from_str(json).map_err(|e| CrunchError::InvalidConfig(e.to_string()))
    }

    /// Set the period reducer.
    pub fn list_operator(mut self, reducer: ReducerKind) -> Self {
        self.list_operator = reducer;
        self
    }

    /// Set the date pattern.
    pub fn date_fmt(mut self, pattern: impl Into<String>) -> Self {
        self.date_fmt = Some(pattern.into());
        self
    }

    /// Set the value pattern.
    pub fn str_fmt(mut self, pattern: impl Into<String>) -> Self {
        self.str_fmt = Some(pattern.into());
        self
    }

    /// Set the rounding precision.
    pub fn round(mut self, places: i32) -> Self {
        self.round = Some(places);
        self
    }

    /// Enable or disable row differencing.
    pub fn delta(mut self, enabled: bool) -> Self {
        self.delta = enabled;
        self
    }

    /// The rounding policy.
    pub fn rounding(&self) -> Rounding {
        match self.round {
            None => Rounding::None,
            Some(0) => Rounding::Integer,
            Some(places) => Rounding::Places(places),
        }
    }

    /// Check the configuration without building anything.
    pub fn validate(&self) -> Result<(), CrunchError> {
        if self.keys.is_empty() {
            return Err(CrunchError::MissingKeys);
        }
        if self.delta && self.str_fmt.is_some() {
            return Err(CrunchError::DeltaWithFormat);
        }
        if let Some(pattern) = &self.date_fmt {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(CrunchError::InvalidDateFormat(pattern.clone()));
            }
        }
        if let Some(pattern) = &self.str_fmt {
            ValueFormat::parse(pattern)?;
        }
        Ok(())
    }
}

/// How numeric cells are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Leave values as they are.
    #[default]
    None,
    /// Round to the nearest integer.
    Integer,
    /// Round to a number of decimal places; negative places round to tens, hundreds, ...
    Places(i32),
}

impl Rounding {
    /// Round a value. A value that cannot be rounded is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statcrunch::table::Rounding;
    ///
    /// assert_eq!(Rounding::Integer.apply(2.5), 3.0);
    /// assert_eq!(Rounding::Places(2).apply(3.14159), 3.14);
    /// assert_eq!(Rounding::Places(-1).apply(1234.0), 1230.0);
    /// ```
    pub fn apply(self, value: f64) -> f64 {
        let rounded = match self {
            Rounding::None => return value,
            Rounding::Integer => value.round(),
            Rounding::Places(places) => {
                let factor = 10_f64.powi(places);
                (value * factor).round() / factor
            }
        };
        if rounded.is_finite() {
            rounded
        } else {
            value
        }
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// A guarded number.
    Number(f64),
    /// The calendar date of a record, when no date pattern is set.
    Date(NaiveDate),
    /// A formatted date or value.
    Text(String),
}

impl Cell {
    /// The number, if this is a numeric cell.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Date(d) => write!(f, "{d}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// One table input: a single record, or a period to be reduced to one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<R> {
    /// A record that becomes one row.
    Single(R),
    /// A group of records that is flattened into one row.
    Period(Vec<R>),
}

/// An ordered list of rows, one per input.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Table {
    /// Rows in input order.
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The cells of column `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> Vec<&Cell> {
        self.rows.iter().filter_map(|row| row.get(idx)).collect()
    }
}

/// Builds tables from records.
///
/// # Examples
///
/// ```rust
/// use statcrunch::{Cell, Input, TableBuilder, TableConfig};
/// use serde_json::json;
///
/// let list = vec![
///     Input::Single(json!({ "dogs": 3, "cats": 10 })),
///     Input::Single(json!({ "dogs": 5, "cats": 11 })),
/// ];
///
/// let builder = TableBuilder::new(TableConfig::new(["dogs", "cats - dogs"])).unwrap();
/// let table = builder.build(&list).unwrap();
///
/// assert_eq!(table.rows[0], vec![Cell::Number(3.0), Cell::Number(7.0)]);
/// assert_eq!(table.rows[1], vec![Cell::Number(5.0), Cell::Number(6.0)]);
/// ```
pub struct TableBuilder {
    config: TableConfig,
    rounding: Rounding,
    value_format: Option<ValueFormat>,
    sink: Box<dyn DiagnosticSink>,
}

impl TableBuilder {
    /// Validate a configuration and create a builder for it.
    pub fn new(config: TableConfig) -> Result<Self, CrunchError> {
        config.validate()?;
        let value_format = config.str_fmt.as_deref().map(ValueFormat::parse).transpose()?;
        Ok(Self {
            rounding: config.rounding(),
            config,
            value_format,
            sink: Box::new(TracingSink),
        })
    }

    /// Report absorbed faults to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// The configuration this builder was created with.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Build a table, one row per input.
    ///
    /// Fails before producing any row if a `date` column is requested
    /// and an input has no timestamp.
    pub fn build<R: Record>(&self, list: &[Input<R>]) -> Result<Table, CrunchError> {
        self.check_timestamps(list)?;

        let raw: Vec<Vec<Cell>> = list.iter().map(|input| self.row(input)).collect();
        let rows = if self.config.delta {
            difference(raw)
        } else {
            raw
        };

        tracing::debug!(
            rows = rows.len(),
            keys = self.config.keys.len(),
            delta = self.config.delta,
            list_operator = %self.config.list_operator,
            "built table"
        );
        Ok(Table { rows })
    }

    fn check_timestamps<R: Record>(&self, list: &[Input<R>]) -> Result<(), CrunchError> {
        if !self.config.keys.iter().any(|key| key == DATE_KEY) {
            return Ok(());
        }
        for (row, input) in list.iter().enumerate() {
            let created_at = match input {
                Input::Single(record) => record.created_at(),
                Input::Period(period) => period.first().and_then(Record::created_at),
            };
            if created_at.is_none() {
                return Err(CrunchError::MissingTimestamp { row });
            }
        }
        Ok(())
    }

    fn row<R: Record>(&self, input: &Input<R>) -> Vec<Cell> {
        match input {
            Input::Single(record) => self.cells(record, &self.config.keys),
            Input::Period(period) => {
                let flat = flatten(
                    period,
                    &self.config.keys,
                    self.config.list_operator,
                    self.sink.as_ref(),
                );
                self.cells(&flat.record, &flat.keys)
            }
        }
    }

    fn cells<R: Record + ?Sized>(&self, record: &R, keys: &[String]) -> Vec<Cell> {
        keys.iter().map(|key| self.cell(record, key)).collect()
    }

    fn cell<R: Record + ?Sized>(&self, record: &R, key: &str) -> Cell {
        if key == DATE_KEY {
            return match (record.created_at(), &self.config.date_fmt) {
                (Some(at), Some(pattern)) => Cell::Text(at.format(pattern).to_string()),
                (Some(at), None) => Cell::Date(at.date_naive()),
                (None, _) => Cell::Number(ZERO),
            };
        }

        let value = self
            .rounding
            .apply(fetch_number(record, key, self.sink.as_ref()));
        match &self.value_format {
            Some(format) => Cell::Text(format.render(value)),
            None => Cell::Number(checked(value)),
        }
    }
}

impl fmt::Debug for TableBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableBuilder")
            .field("config", &self.config)
            .field("rounding", &self.rounding)
            .field("sink", &"<dyn DiagnosticSink>")
            .finish()
    }
}

/// Difference every numeric cell against the previous raw row.
///
/// The first row passes through unchanged. The accumulator always holds
/// the previous undifferenced row.
fn difference(raw: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    let (rows, _) = raw.into_iter().fold(
        (Vec::new(), None::<Vec<Cell>>),
        |(mut rows, previous), row| {
            let out = match &previous {
                None => row.clone(),
                Some(previous) => row
                    .iter()
                    .enumerate()
                    .map(|(idx, cell)| match (cell, previous.get(idx)) {
                        (Cell::Number(now), Some(Cell::Number(before))) => {
                            Cell::Number(checked(now - before))
                        }
                        _ => cell.clone(),
                    })
                    .collect(),
            };
            rows.push(out);
            (rows, Some(row))
        },
    );
    rows
}

/// Build a table in one call, logging faults through `tracing`.
///
/// # Examples
///
/// ```rust
/// use statcrunch::{as_table, CrunchError, Input, TableConfig};
/// use serde_json::json;
///
/// let list = vec![Input::Single(json!({ "dogs": 3 }))];
///
/// let err = as_table(&list, &TableConfig::default()).unwrap_err();
/// assert_eq!(err, CrunchError::MissingKeys);
/// ```
pub fn as_table<R: Record>(list: &[Input<R>], config: &TableConfig) -> Result<Table, CrunchError> {
    TableBuilder::new(config.clone())?.build(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::record::DataRecord;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn dated(day: u32, data: serde_json::Value) -> DataRecord {
        DataRecord::new(data).with_created_at(Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap())
    }

    fn numbers(row: &[Cell]) -> Vec<f64> {
        row.iter().filter_map(Cell::as_number).collect()
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(TableConfig::default().validate(), Err(CrunchError::MissingKeys));
        assert_eq!(
            TableConfig::new(["a"]).delta(true).str_fmt("%d").validate(),
            Err(CrunchError::DeltaWithFormat)
        );
        assert_eq!(
            TableConfig::new(["a"]).str_fmt("%q").validate(),
            Err(CrunchError::InvalidFormat("%q".into()))
        );
        assert_eq!(
            TableConfig::new(["date"]).date_fmt("%Y-%!").validate(),
            Err(CrunchError::InvalidDateFormat("%Y-%!".into()))
        );
        assert!(TableConfig::new(["a"]).delta(true).validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config = TableConfig::from_json(r#"{ "keys": ["a"], "delta": true }"#).unwrap();
        assert_eq!(config.keys, vec!["a"]);
        assert!(config.delta);
        assert_eq!(config.list_operator, ReducerKind::Mean);

        assert!(matches!(
            TableConfig::from_json(r#"{ "keys": ["a"], "list_operator": "avg" }"#),
            Err(CrunchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rounding_policy() {
        assert_eq!(TableConfig::new(["a"]).rounding(), Rounding::None);
        assert_eq!(TableConfig::new(["a"]).round(0).rounding(), Rounding::Integer);
        assert_eq!(TableConfig::new(["a"]).round(3).rounding(), Rounding::Places(3));
        assert_eq!(Rounding::Places(300).apply(1e300), 1e300);
    }

    #[test]
    fn test_build_rounds_then_formats() {
        let list = vec![Input::Single(json!({ "a": 2.0, "b": 3.0 }))];
        let config = TableConfig::new(["a / b"]).round(2).str_fmt("%.3f");

        let table = as_table(&list, &config).unwrap();
        assert_eq!(table.rows[0], vec![Cell::Text("0.670".into())]);
    }

    #[test]
    fn test_build_default_date() {
        let list = vec![Input::Single(dated(7, json!({ "a": 1 })))];
        let table = as_table(&list, &TableConfig::new(["date", "a"])).unwrap();

        assert_eq!(
            table.rows[0],
            vec![
                Cell::Date(NaiveDate::from_ymd_opt(2024, 5, 7).unwrap()),
                Cell::Number(1.0)
            ]
        );
    }

    #[test]
    fn test_build_formatted_date() {
        let list = vec![Input::Single(dated(7, json!({ "a": 1 })))];
        let config = TableConfig::new(["date"]).date_fmt("%d/%m/%Y");
        let table = as_table(&list, &config).unwrap();

        assert_eq!(table.rows[0], vec![Cell::Text("07/05/2024".into())]);
    }

    #[test]
    fn test_build_date_requires_timestamp() {
        let list = vec![
            Input::Single(dated(1, json!({ "a": 1 }))),
            Input::Single(DataRecord::new(json!({ "a": 2 }))),
        ];
        assert_eq!(
            as_table(&list, &TableConfig::new(["date", "a"])),
            Err(CrunchError::MissingTimestamp { row: 1 })
        );
    }

    #[test]
    fn test_delta_uses_raw_previous_row() {
        let list: Vec<_> = [1.0, 4.0, 9.0, 16.0]
            .into_iter()
            .map(|n| Input::Single(json!({ "n": n })))
            .collect();
        let table = as_table(&list, &TableConfig::new(["n"]).delta(true)).unwrap();

        let column: Vec<f64> = table.rows.iter().flat_map(|row| numbers(row)).collect();
        assert_eq!(column, vec![1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_delta_leaves_dates_alone() {
        let list = vec![
            Input::Single(dated(1, json!({ "n": 10 }))),
            Input::Single(dated(2, json!({ "n": 4 }))),
        ];
        let config = TableConfig::new(["date", "n"]).delta(true).date_fmt("%d");
        let table = as_table(&list, &config).unwrap();

        assert_eq!(table.rows[1], vec![Cell::Text("02".into()), Cell::Number(-6.0)]);
    }

    #[test]
    fn test_mixed_inputs() {
        let list = vec![
            Input::Period(vec![
                dated(1, json!({ "dogs": 2, "cats": 5 })),
                dated(2, json!({ "dogs": 4, "cats": 9 })),
            ]),
            Input::Single(dated(3, json!({ "dogs": 7, "cats": 7 }))),
        ];
        let builder = TableBuilder::new(
            TableConfig::new(["date", "dogs", "cats - dogs"]).list_operator(ReducerKind::Sum),
        )
        .unwrap()
        .with_sink(NullSink);
        let table = builder.build(&list).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows[0],
            vec![
                Cell::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
                Cell::Number(6.0),
                Cell::Number(8.0),
            ]
        );
        assert_eq!(numbers(&table.rows[1]), vec![7.0, 0.0]);
    }

    #[test]
    fn test_mapping_cell_is_zero() {
        let list = vec![Input::Single(json!({ "users": { "count": 3 } }))];
        let table = TableBuilder::new(TableConfig::new(["users"]))
            .unwrap()
            .with_sink(NullSink)
            .build(&list)
            .unwrap();
        assert_eq!(table.rows[0], vec![Cell::Number(0.0)]);
    }

    #[test]
    fn test_table_serializes_as_rows() {
        let table = Table {
            rows: vec![vec![
                Cell::Number(1.5),
                Cell::Text("x".into()),
                Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            ]],
        };
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!([[1.5, "x", "2024-01-02"]])
        );
    }
}
