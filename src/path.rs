//! Path resolution module.
//!
//! Resolves plain keys (`"doors"`) and slash-delimited paths
//! (`"loans/requested/GBP"`) against a record payload. Keys containing an
//! operator surrounded by spaces are handed to the expression evaluator.
//!
//! Resolution is total: a missing key is [`Resolved::NotFound`], never an
//! error. What went missing is reported to a [`DiagnosticSink`].

use crate::diagnostics::{DiagnosticSink, Fault, TracingSink};
use crate::expr;
use crate::numeric::ZERO;
use crate::record::Record;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Path segment separator.
pub const SEPARATOR: char = '/';

/// Outcome of resolving a key against a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// A numeric leaf, or the result of an expression.
    Number(f64),
    /// A nested mapping. The value is always a JSON object.
    Mapping(&'a Value),
    /// Nothing usable lives at this key.
    NotFound,
}

impl<'a> Resolved<'a> {
    /// The number, if one was found.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Resolved::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The nested mapping, if one was found.
    pub fn as_mapping(&self) -> Option<&'a Map<String, Value>> {
        match self {
            Resolved::Mapping(value) => value.as_object(),
            _ => None,
        }
    }

    /// Whether anything was found.
    pub fn is_found(&self) -> bool {
        !matches!(self, Resolved::NotFound)
    }

    /// The number, with anything else counting as zero.
    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(ZERO)
    }
}

/// Resolve a key against a record, logging faults through `tracing`.
///
/// # Examples
///
/// ```rust
/// use statcrunch::path::{resolve, Resolved};
/// use serde_json::json;
///
/// let data = json!({ "loans": { "requested": { "GBP": 0.65 } }, "doors": 10 });
///
/// assert_eq!(resolve(&data, "doors"), Resolved::Number(10.0));
/// assert_eq!(resolve(&data, "loans/requested/GBP"), Resolved::Number(0.65));
/// assert_eq!(resolve(&data, "loans/payed/GBP"), Resolved::NotFound);
/// assert_eq!(resolve(&data, "doors - 4"), Resolved::Number(6.0));
/// ```
pub fn resolve<'a, R: Record + ?Sized>(record: &'a R, key: &str) -> Resolved<'a> {
    resolve_with(record, key, &TracingSink)
}

/// Resolve a key against a record, reporting faults to `sink`.
///
/// Expression keys are evaluated first; everything else is looked up as
/// a plain key, then under its alternate spelling, then segment by
/// segment when it contains a `/`.
pub fn resolve_with<'a, R: Record + ?Sized>(
    record: &'a R,
    key: &str,
    sink: &dyn DiagnosticSink,
) -> Resolved<'a> {
    if expr::is_expression(key) {
        return Resolved::Number(expr::evaluate_with(record, key, sink));
    }
    lookup(record.data(), key, sink)
}

/// Resolve a key to a number, treating anything else as zero.
///
/// This is the per-cell lookup used when building tables.
pub fn fetch_number<R: Record + ?Sized>(record: &R, key: &str, sink: &dyn DiagnosticSink) -> f64 {
    resolve_with(record, key, sink).number_or_zero()
}

/// The other spelling of a key: `":doors"` for `"doors"` and back.
pub fn alternate_key(key: &str) -> Cow<'_, str> {
    match key.strip_prefix(':') {
        Some(bare) => Cow::Borrowed(bare),
        None => Cow::Owned(format!(":{key}")),
    }
}

fn get_either<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| map.get(alternate_key(key).as_ref()))
}

fn lookup<'a>(data: &'a Value, key: &str, sink: &dyn DiagnosticSink) -> Resolved<'a> {
    let Some(map) = data.as_object() else {
        sink.report(Fault::NotFound { key: key.to_string() });
        return Resolved::NotFound;
    };

    if let Some(value) = get_either(map, key) {
        return classify(key, value, sink);
    }

    if key.contains(SEPARATOR) {
        return traverse(map, key, sink);
    }

    sink.report(Fault::NotFound { key: key.to_string() });
    Resolved::NotFound
}

fn traverse<'a>(root: &'a Map<String, Value>, key: &str, sink: &dyn DiagnosticSink) -> Resolved<'a> {
    let mut segments = key.split(SEPARATOR);
    let mut current = match segments.next().and_then(|first| get_either(root, first)) {
        Some(value) => value,
        None => {
            sink.report(Fault::NotFound { key: key.to_string() });
            return Resolved::NotFound;
        }
    };

    for segment in segments {
        let Some(map) = current.as_object() else {
            sink.report(Fault::NotAMapping {
                key: key.to_string(),
                segment: segment.to_string(),
            });
            return Resolved::NotFound;
        };
        current = match get_either(map, segment) {
            Some(value) => value,
            None => {
                sink.report(Fault::NotFound { key: key.to_string() });
                return Resolved::NotFound;
            }
        };
    }

    classify(key, current, sink)
}

fn classify<'a>(key: &str, value: &'a Value, sink: &dyn DiagnosticSink) -> Resolved<'a> {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(n) => Resolved::Number(n),
            None => {
                sink.report(Fault::Unsupported { key: key.to_string() });
                Resolved::NotFound
            }
        },
        Value::Object(_) => Resolved::Mapping(value),
        _ => {
            sink.report(Fault::Unsupported { key: key.to_string() });
            Resolved::NotFound
        }
    }
}
