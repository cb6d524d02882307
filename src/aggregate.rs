//! Period aggregation module.
//!
//! Collapses a period (a group of records, usually produced by bucketing
//! records by hour, day, week, month or year) into one synthetic record.
//! Every requested key is fetched from each record in the period and the
//! collected numbers are reduced with a [`ReducerKind`].
//!
//! Expression keys cannot be looked up again on the synthetic record, so
//! each key is stored under a sanitized name and the returned key list
//! uses those names. Keys that sanitize to the same name are told apart
//! with a numeric suffix (`cats_dogs`, `cats_dogs_2`).

use crate::diagnostics::DiagnosticSink;
use crate::path::fetch_number;
use crate::record::{DataRecord, Record};
use crate::reduce::ReducerKind;
use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::LazyLock;

/// The key that selects the record timestamp instead of a value.
pub const DATE_KEY: &str = "date";

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s*/:x+-]+").expect("sanitize pattern is valid"));

/// Replace every run of operator or whitespace characters with `_`.
///
/// # Examples
///
/// ```rust
/// use statcrunch::aggregate::sanitize_key;
///
/// assert_eq!(sanitize_key("dogs - cats"), "dogs_cats");
/// assert_eq!(sanitize_key("loans/payed/GBP"), "loans_payed_GBP");
/// assert_eq!(sanitize_key("doors"), "doors");
/// ```
pub fn sanitize_key(key: &str) -> Cow<'_, str> {
    UNSAFE_RUN.replace_all(key, "_")
}

/// The result of flattening one period.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    /// Keys addressing the synthetic record, in the order requested.
    pub keys: Vec<String>,
    /// Read-only record holding one reduced value per key.
    pub record: DataRecord,
}

/// Flatten a period of records into a single synthetic record.
///
/// The `date` key is not reduced: the synthetic record takes the
/// timestamp of the first record in the period. Missing values count as
/// zero. An empty period yields zeros and no timestamp.
///
/// # Examples
///
/// ```rust
/// use statcrunch::aggregate::flatten;
/// use statcrunch::diagnostics::NullSink;
/// use statcrunch::{ReducerKind, Record};
/// use serde_json::json;
///
/// let period = vec![json!({ "dogs": 4, "cats": 10 }), json!({ "dogs": 6, "cats": 20 })];
/// let keys = vec!["dogs".to_string(), "cats - dogs".to_string()];
///
/// let flat = flatten(&period, &keys, ReducerKind::Sum, &NullSink);
/// assert_eq!(flat.keys, vec!["dogs", "cats_dogs"]);
/// assert_eq!(flat.record.get("cats_dogs"), Some(&json!(20.0)));
/// ```
pub fn flatten<R: Record>(
    period: &[R],
    keys: &[String],
    reducer: ReducerKind,
    sink: &dyn DiagnosticSink,
) -> Flattened {
    let mut data = Map::new();
    let mut adjusted = Vec::with_capacity(keys.len());
    let mut created_at = None;

    for key in keys {
        if key == DATE_KEY {
            created_at = period.first().and_then(Record::created_at);
            adjusted.push(key.clone());
            continue;
        }

        let flat_key = unique_key(&data, sanitize_key(key).into_owned());
        let values: Vec<f64> = period
            .iter()
            .map(|record| fetch_number(record, key, sink))
            .collect();
        let value = reducer.apply(&values);

        data.insert(flat_key.clone(), Value::from(value));
        adjusted.push(flat_key);
    }

    let mut record = DataRecord::new(Value::Object(data));
    if let Some(created_at) = created_at {
        record = record.with_created_at(created_at);
    }
    record.mark_readonly();

    Flattened {
        keys: adjusted,
        record,
    }
}

/// First of `name`, `name_2`, `name_3`, ... not yet present in `data`.
fn unique_key(data: &Map<String, Value>, name: String) -> String {
    let mut candidate = name.clone();
    let mut suffix = 1;
    while data.contains_key(&candidate) {
        suffix += 1;
        candidate = format!("{name}_{suffix}");
    }
    candidate
}
