//! Statistical reducers.
//!
//! Each reducer collapses a sequence of numbers into one. Results are
//! guarded, so an empty sequence or a single-element standard deviation
//! yields `0.0` rather than `NaN`.

use crate::error::CrunchError;
use crate::numeric::{checked, coerce, ZERO};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which reducer to apply to a period of records.
///
/// # Examples
///
/// ```rust
/// use statcrunch::ReducerKind;
///
/// let kind: ReducerKind = "median".parse().unwrap();
/// assert_eq!(kind.apply(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
/// assert_eq!(ReducerKind::default(), ReducerKind::Mean);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducerKind {
    /// Arithmetic total.
    Sum,
    /// Sum divided by count.
    #[default]
    Mean,
    /// Sample standard deviation.
    Stddev,
    /// Middle value, or mean of the two middle values.
    Median,
    /// Most frequent value, first seen wins ties.
    Mode,
    /// Largest minus smallest.
    Range,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Largest minus smallest, same as [`ReducerKind::Range`].
    Delta,
}

impl ReducerKind {
    /// All reducers, in declaration order.
    pub const ALL: [ReducerKind; 9] = [
        ReducerKind::Sum,
        ReducerKind::Mean,
        ReducerKind::Stddev,
        ReducerKind::Median,
        ReducerKind::Mode,
        ReducerKind::Range,
        ReducerKind::Min,
        ReducerKind::Max,
        ReducerKind::Delta,
    ];

    /// The lowercase name used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            ReducerKind::Sum => "sum",
            ReducerKind::Mean => "mean",
            ReducerKind::Stddev => "stddev",
            ReducerKind::Median => "median",
            ReducerKind::Mode => "mode",
            ReducerKind::Range => "range",
            ReducerKind::Min => "min",
            ReducerKind::Max => "max",
            ReducerKind::Delta => "delta",
        }
    }

    /// Reduce `values` to a single guarded number.
    pub fn apply(self, values: &[f64]) -> f64 {
        let value = match self {
            ReducerKind::Sum => sum(values),
            ReducerKind::Mean => mean(values),
            ReducerKind::Stddev => stddev(values),
            ReducerKind::Median => median(values),
            ReducerKind::Mode => mode(values),
            ReducerKind::Range | ReducerKind::Delta => range(values),
            ReducerKind::Min => min(values),
            ReducerKind::Max => max(values),
        };
        checked(value)
    }
}

impl FromStr for ReducerKind {
    type Err = CrunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CrunchError::UnknownReducer(s.to_string()))
    }
}

impl fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arithmetic total.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Total of arbitrary leaf values.
///
/// Booleans count as 1/0 and anything that is not a number contributes 0.
///
/// # Examples
///
/// ```rust
/// use statcrunch::reduce::sum_values;
/// use serde_json::json;
///
/// assert_eq!(sum_values(&[json!(1), json!(true), json!(3)]), 4.0);
/// assert_eq!(sum_values(&[json!("a"), json!("b")]), 0.0);
/// ```
pub fn sum_values(values: &[Value]) -> f64 {
    values.iter().map(coerce).sum()
}

/// Sum divided by count.
pub fn mean(values: &[f64]) -> f64 {
    checked(sum(values) / values.len() as f64)
}

/// Sample standard deviation, `0.0` for fewer than two values.
pub fn stddev(values: &[f64]) -> f64 {
    let avg = mean(values);
    let squares: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    checked((squares / (values.len() as f64 - 1.0)).sqrt())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut list = values.to_vec();
    list.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    list
}

/// Middle value; the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> f64 {
    let list = sorted(values);
    let count = list.len();
    if count == 0 {
        return ZERO;
    }
    let center = count / 2;
    if count % 2 == 0 {
        mean(&[list[center - 1], list[center]])
    } else {
        list[center]
    }
}

/// Most frequent value. Ties go to the value seen first.
pub fn mode(values: &[f64]) -> f64 {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for &value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map_or(ZERO, |(value, _)| value)
}

/// Largest minus smallest.
pub fn range(values: &[f64]) -> f64 {
    let list = sorted(values);
    match (list.first(), list.last()) {
        (Some(first), Some(last)) => last - first,
        _ => ZERO,
    }
}

/// Smallest value.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(ZERO)
}

/// Largest value.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sum() {
        assert_eq!(sum(&[1.0, 2.0, 3.0]), 6.0);
        assert_eq!(sum_values(&[json!(1), json!(true), json!(3)]), 4.0);
        assert_eq!(sum_values(&[json!("a"), json!("b"), json!("c")]), 0.0);
    }

    #[test]
    fn test_mean() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&values), sum(&values) / 4.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), mean(&[2.0, 3.0]));
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_range() {
        assert_eq!(range(&[2.0, 3.0, 4.0, 5.0, 6.0]), 4.0);
        assert_eq!(range(&[6.0, 2.0]), 4.0);
        assert_eq!(ReducerKind::Delta.apply(&[6.0, 2.0, 3.0]), 4.0);
    }

    #[test]
    fn test_mode() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0];
        assert_eq!(mode(&values), 1.0);
    }

    #[test]
    fn test_mode_tie_goes_to_first_seen() {
        assert_eq!(mode(&[3.0, 2.0, 2.0, 3.0]), 3.0);
        assert_eq!(mode(&[2.0, 3.0, 3.0, 2.0]), 2.0);
    }

    #[test]
    fn test_stddev() {
        assert_eq!(format!("{:.4}", stddev(&[1.0, 2.0, 3.0, 4.0])), "1.2910");
        assert_eq!(stddev(&[5.0]), 0.0);
        assert_eq!(stddev(&[]), 0.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min(&[3.0, -1.0, 2.0]), -1.0);
        assert_eq!(max(&[3.0, -1.0, 2.0]), 3.0);
        assert_eq!(max(&[]), 0.0);
    }

    #[test]
    fn test_reducer_kind_names() {
        for kind in ReducerKind::ALL {
            assert_eq!(kind.name().parse::<ReducerKind>(), Ok(kind));
        }
        assert_eq!(
            "average".parse::<ReducerKind>(),
            Err(CrunchError::UnknownReducer("average".into()))
        );
    }

    #[test]
    fn test_reducer_kind_serde() {
        let kind: ReducerKind = serde_json::from_value(json!("stddev")).unwrap();
        assert_eq!(kind, ReducerKind::Stddev);
        assert_eq!(serde_json::to_value(ReducerKind::Max).unwrap(), json!("max"));
    }
}
