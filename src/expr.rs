//! Expression evaluation module.
//!
//! Expressions are three tokens: `left op right`, where each operand is a
//! numeric literal or a path, and `op` is one of `+ - * / x :` surrounded
//! by single spaces. Parenthesized groups are evaluated innermost first
//! and replaced by their value before the outer split.
//!
//! ```text
//! "(keys - doors) * 2"  ->  "-2 * 2"  ->  -4
//! ```
//!
//! Evaluation is total. Missing operands count as zero, and any
//! arithmetic fault yields zero after being reported to the sink.

use crate::diagnostics::{DiagnosticSink, Fault, TracingSink};
use crate::numeric::{checked, ZERO};
use crate::path::{self, Resolved};
use crate::record::Record;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static OPERATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" [*/:x+-] ").expect("operator pattern is valid"));

static GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)").expect("group pattern is valid"));

static LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("literal pattern is valid")
});

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`, also written `x`.
    Mul,
    /// `/`, also written `:`.
    Div,
}

impl Operator {
    /// Parse an operator token, accepting the `x` and `:` aliases.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statcrunch::expr::Operator;
    ///
    /// assert_eq!(Operator::from_token("x"), Some(Operator::Mul));
    /// assert_eq!(Operator::from_token(":"), Some(Operator::Div));
    /// assert_eq!(Operator::from_token("%"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "*" | "x" => Some(Operator::Mul),
            "/" | ":" => Some(Operator::Div),
            _ => None,
        }
    }

    /// The canonical symbol.
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }

    /// Apply the operator. Division is always floating point.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div => left / right,
        }
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or(())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Whether a key is an expression rather than a plain path.
///
/// # Examples
///
/// ```rust
/// use statcrunch::expr::is_expression;
///
/// assert!(is_expression("keys - doors"));
/// assert!(is_expression("a x 2"));
/// assert!(!is_expression("loans/requested/GBP"));
/// assert!(!is_expression("keys-doors"));
/// ```
pub fn is_expression(key: &str) -> bool {
    OPERATOR.is_match(key)
}

/// Whether a token is a numeric literal.
pub fn is_literal(token: &str) -> bool {
    LITERAL.is_match(token)
}

/// Evaluate an expression, logging faults through `tracing`.
///
/// # Examples
///
/// ```rust
/// use statcrunch::expr::evaluate;
/// use serde_json::json;
///
/// let data = json!({ "doors": 10, "keys": 8 });
///
/// assert_eq!(evaluate(&data, "keys - doors"), -2.0);
/// assert_eq!(evaluate(&data, "(keys + doors) : 4"), 4.5);
/// assert_eq!(evaluate(&data, "keys / 0"), 0.0);
/// ```
pub fn evaluate<R: Record + ?Sized>(record: &R, expr: &str) -> f64 {
    evaluate_with(record, expr, &TracingSink)
}

/// Evaluate an expression, reporting faults to `sink`.
///
/// Never fails; the result is always finite.
pub fn evaluate_with<R: Record + ?Sized>(record: &R, expr: &str, sink: &dyn DiagnosticSink) -> f64 {
    let reduced = reduce_groups(record, expr, sink);
    checked(compute(record, expr, &reduced, sink))
}

/// Replace every well-formed innermost group with its value.
///
/// Unmatched parentheses never match and stay in the text as-is.
fn reduce_groups<R: Record + ?Sized>(record: &R, expr: &str, sink: &dyn DiagnosticSink) -> String {
    let mut current = expr.to_string();
    loop {
        let Some((range, inner)) = GROUP.captures(&current).and_then(|caps| {
            let whole = caps.get(0)?.range();
            Some((whole, caps.get(1)?.as_str().to_string()))
        }) else {
            return current;
        };
        let value = evaluate_with(record, &inner, sink);
        current.replace_range(range, &value.to_string());
    }
}

fn compute<R: Record + ?Sized>(
    record: &R,
    expr: &str,
    reduced: &str,
    sink: &dyn DiagnosticSink,
) -> f64 {
    let tokens: Vec<&str> = reduced.split_whitespace().collect();

    // A lone operand is what a group like "(doors)" reduces to.
    if let [single] = tokens.as_slice() {
        return operand(record, expr, single, sink).unwrap_or(ZERO);
    }

    if tokens.len() != 3 {
        sink.report(Fault::MalformedExpression {
            expr: expr.to_string(),
        });
    }

    let left = tokens
        .first()
        .map_or(Some(ZERO), |token| operand(record, expr, token, sink));
    let right = tokens
        .get(2)
        .map_or(Some(ZERO), |token| operand(record, expr, token, sink));

    // A mapping operand cannot take part in arithmetic.
    let (Some(left), Some(right)) = (left, right) else {
        return ZERO;
    };

    let Some(op) = tokens.get(1).copied().and_then(Operator::from_token) else {
        sink.report(Fault::UnknownOperator {
            expr: expr.to_string(),
            op: tokens.get(1).copied().unwrap_or_default().to_string(),
        });
        return ZERO;
    };

    if op == Operator::Div && right == ZERO {
        sink.report(Fault::DivisionByZero {
            expr: expr.to_string(),
        });
        return ZERO;
    }

    let value = op.apply(left, right);
    if !value.is_finite() {
        sink.report(Fault::NonFinite {
            expr: expr.to_string(),
        });
        return ZERO;
    }
    value
}

/// Value of one operand. Missing operands are zero; `None` marks a mapping.
fn operand<R: Record + ?Sized>(
    record: &R,
    expr: &str,
    token: &str,
    sink: &dyn DiagnosticSink,
) -> Option<f64> {
    if is_literal(token) {
        return Some(token.parse::<f64>().map(checked).unwrap_or(ZERO));
    }
    match path::resolve_with(record, token, sink) {
        Resolved::Number(n) => Some(n),
        Resolved::Mapping(_) => {
            sink.report(Fault::NotANumber {
                expr: expr.to_string(),
                operand: token.to_string(),
            });
            None
        }
        Resolved::NotFound => Some(ZERO),
    }
}
