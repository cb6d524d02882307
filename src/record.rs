//! Records module.
//!
//! A record exposes a keyed payload of values plus an optional creation
//! timestamp. The engine never looks further into a record than that.
//! [`DataRecord`] is the concrete record used for synthetic period
//! records and record-level deltas, and is the easiest way to feed data in.

use crate::error::CrunchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Capability required from anything the engine reads values from.
///
/// The payload is usually a JSON object. Leaves are numbers, nested
/// objects are traversed by slash-delimited paths, and every other value
/// is ignored.
///
/// # Examples
///
/// ```rust
/// use statcrunch::Record;
/// use serde_json::{json, Value};
///
/// struct Sample(Value);
///
/// impl Record for Sample {
///     fn data(&self) -> &Value {
///         &self.0
///     }
/// }
///
/// let sample = Sample(json!({ "doors": 10 }));
/// assert_eq!(sample.get("doors"), Some(&json!(10)));
/// ```
pub trait Record {
    /// The record payload.
    fn data(&self) -> &Value;

    /// When the record was created, if known.
    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Look up a top-level key in the payload.
    fn get(&self, key: &str) -> Option<&Value> {
        self.data().as_object().and_then(|map| map.get(key))
    }
}

/// A bare JSON value is a record without a timestamp.
impl Record for Value {
    fn data(&self) -> &Value {
        self
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn data(&self) -> &Value {
        (**self).data()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        (**self).created_at()
    }
}

/// A record backed by a JSON value.
///
/// # Examples
///
/// ```rust
/// use statcrunch::DataRecord;
/// use serde_json::json;
///
/// let mut record = DataRecord::new(json!({ "doors": 10 }));
/// record.insert("keys", json!(8)).unwrap();
///
/// record.mark_readonly();
/// assert!(record.insert("locks", json!(2)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    data: Value,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    readonly: bool,
}

impl DataRecord {
    /// Create a record from a payload.
    pub fn new(data: Value) -> Self {
        Self {
            data,
            created_at: None,
            readonly: false,
        }
    }

    /// Create a record with an empty mapping payload.
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Set the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Set the creation timestamp in place.
    pub fn set_created_at(&mut self, created_at: Option<DateTime<Utc>>) -> Result<(), CrunchError> {
        if self.readonly {
            return Err(CrunchError::ReadOnly);
        }
        self.created_at = created_at;
        Ok(())
    }

    /// Insert a top-level value.
    ///
    /// A non-object payload is replaced by an object holding only the
    /// new entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), CrunchError> {
        if self.readonly {
            return Err(CrunchError::ReadOnly);
        }
        if !self.data.is_object() {
            self.data = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.data {
            map.insert(key.into(), value);
        }
        Ok(())
    }

    /// Freeze the record. Further mutation returns [`CrunchError::ReadOnly`].
    pub fn mark_readonly(&mut self) {
        self.readonly = true;
    }

    /// Whether the record has been frozen.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Entity-wise difference `self - other`, see [`record_delta`].
    pub fn delta(&self, other: &impl Record) -> Option<DataRecord> {
        record_delta(self, other)
    }
}

impl Default for DataRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for DataRecord {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

impl Record for DataRecord {
    fn data(&self) -> &Value {
        &self.data
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Subtract two mappings key by key.
///
/// Only keys of `left` that also exist in `right` appear in the result.
/// Nested mappings recurse; a nested mapping facing a non-mapping yields
/// `null`. Numbers subtract, staying integral when both sides are
/// integers. Any other pairing yields `null`.
///
/// # Examples
///
/// ```rust
/// use statcrunch::record::delta_map;
/// use serde_json::json;
///
/// let a = json!({ "a": 4, "b": 1 });
/// let b = json!({ "a": 2, "b": 2 });
/// let delta = delta_map(a.as_object().unwrap(), b.as_object().unwrap());
/// assert_eq!(serde_json::Value::Object(delta), json!({ "a": 2, "b": -1 }));
/// ```
pub fn delta_map(left: &Map<String, Value>, right: &Map<String, Value>) -> Map<String, Value> {
    left.iter()
        .filter_map(|(key, value)| {
            let other = right.get(key)?;
            let diff = match (value, other) {
                (Value::Object(l), Value::Object(r)) => Value::Object(delta_map(l, r)),
                (Value::Number(l), Value::Number(r)) => subtract(l, r),
                _ => Value::Null,
            };
            Some((key.clone(), diff))
        })
        .collect()
}

fn subtract(left: &Number, right: &Number) -> Value {
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        if let Some(diff) = l.checked_sub(r) {
            return Value::from(diff);
        }
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => Number::from_f64(l - r).map_or(Value::Null, Value::Number),
        _ => Value::Null,
    }
}

/// Entity-wise difference of two records.
///
/// Returns `None` unless both payloads are mappings. The result is a
/// read-only [`DataRecord`] without a timestamp.
pub fn record_delta(left: &impl Record, right: &impl Record) -> Option<DataRecord> {
    let (l, r) = (left.data().as_object()?, right.data().as_object()?);
    let mut delta = DataRecord::new(Value::Object(delta_map(l, r)));
    delta.mark_readonly();
    Some(delta)
}
