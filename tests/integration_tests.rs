use serde_json::{json, Value};
use statcrunch::diagnostics::{DiagnosticSink, Fault};
use statcrunch::expr::evaluate_with;
use statcrunch::path::resolve_with;
use statcrunch::reduce::{mean, median, mode, range, stddev, sum};
use statcrunch::*;
use std::sync::Mutex;

#[derive(Default)]
struct Recorder(Mutex<Vec<Fault>>);

impl DiagnosticSink for Recorder {
    fn report(&self, fault: Fault) {
        self.0.lock().unwrap().push(fault);
    }
}

fn deep_record() -> DataRecord {
    DataRecord::new(json!({
        "users": { "count": 14, "active": 2 },
        "loans": {
            "requested": { "EUR": 781.284599, "GBP": 0.65395, "USD": 0.65395, "AWG": 0.65395 },
            "payed": { "EUR": 130.42, "GBP": 145.23 }
        },
        "orders": { "count": 8, "lines": 14 },
        "commission": {
            "approved": { "EUR": 32.56 },
            "pending": { "EUR": 0.8492, "GBP": 1.3079, "USD": 1.3079 }
        },
    }))
}

/// The guard maps every non-finite or missing value to zero and is idempotent.
#[test]
fn test_numeric_guard() {
    assert_eq!(checked(f64::NAN), 0.0);
    assert_eq!(checked(f64::INFINITY), 0.0);
    assert_eq!(numeric::checked_value(None), 0.0);
    for value in [f64::NAN, -1.5, 42.0, f64::NEG_INFINITY] {
        assert_eq!(checked(checked(value)), checked(value));
    }
}

/// Basic fetches and the expression shortcut.
#[test]
fn test_fetch_basics() {
    let record = DataRecord::new(json!({ "doors": 10, "keys": 8 }));

    assert_eq!(resolve(&record, "doors"), Resolved::Number(10.0));
    assert_eq!(resolve(&record, "keys - doors"), Resolved::Number(-2.0));
}

/// Deep paths resolve like nested single-step resolution.
#[test]
fn test_deep_paths() {
    let record = deep_record();

    assert_eq!(resolve(&record, "loans/requested/GBP"), Resolved::Number(0.65395));

    let Resolved::Mapping(loans) = resolve(&record, "loans") else {
        panic!("loans should be a mapping");
    };
    let Resolved::Mapping(requested) = resolve(loans, "requested") else {
        panic!("requested should be a mapping");
    };
    assert_eq!(resolve(&record, "loans/requested/EUR"), resolve(requested, "EUR"));

    let value = evaluate(&record, "loans/requested/GBP + loans/payed/GBP");
    assert!((value - (0.65395 + 145.23)).abs() < 1e-9);
}

/// Subtraction of two paths equals subtraction of their values.
#[test]
fn test_expression_matches_resolution() {
    let record = deep_record();
    let pairs = [
        ("users/count", "users/active"),
        ("orders/lines", "orders/count"),
        ("commission/approved/EUR", "commission/pending/EUR"),
        ("users/count", "users/missing"),
    ];

    for (x, y) in pairs {
        let expected = resolve(&record, x).number_or_zero() - resolve(&record, y).number_or_zero();
        let actual = evaluate(&record, &format!("{x} - {y}"));
        assert!((actual - expected).abs() < 1e-12, "{x} - {y}");
    }
}

/// Record-level delta subtracts every numeric leaf.
#[test]
fn test_record_delta() {
    let a = deep_record();
    let b = DataRecord::new(json!({
        "users": { "count": 10, "active": 5 },
        "loans": {
            "requested": { "EUR": 700.0, "GBP": 0.5, "USD": 0.5, "AWG": 0.5 },
            "payed": { "EUR": 100.0, "GBP": 100.0 }
        },
        "orders": { "count": 3, "lines": 4 },
        "commission": {
            "approved": { "EUR": 30.0 },
            "pending": { "EUR": 0.5, "GBP": 1.0, "USD": 1.0 }
        },
    }));

    let delta = record_delta(&a, &b).unwrap();
    for key in [
        "users/count",
        "users/active",
        "loans/requested/EUR",
        "loans/payed/GBP",
        "orders/lines",
        "commission/pending/GBP",
    ] {
        let expected = resolve(&a, key).number_or_zero() - resolve(&b, key).number_or_zero();
        let actual = resolve(&delta, key).number_or_zero();
        assert!((actual - expected).abs() < 1e-9, "{key}");
    }

    let zero = a.delta(&a).unwrap();
    assert_eq!(resolve(&zero, "loans/requested/EUR"), Resolved::Number(0.0));
    assert_eq!(resolve(&zero, "users/count"), Resolved::Number(0.0));
}

/// Reducer properties on small fixed inputs.
#[test]
fn test_reducer_properties() {
    assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), sum(&[1.0, 2.0, 3.0, 4.0]) / 4.0);
    assert_eq!(median(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
    assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), mean(&[2.0, 3.0]));
    assert_eq!(range(&[2.0, 3.0, 4.0, 5.0, 6.0]), 4.0);
    assert_eq!(
        mode(&[1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0]),
        1.0
    );
    assert_eq!(format!("{:.4}", stddev(&[1.0, 2.0, 3.0, 4.0])), "1.2910");
}

/// Unterminated groups degrade instead of failing.
#[test]
fn test_malformed_grouping() {
    let record = DataRecord::new(json!({ "a": 3, "b": 4 }));
    let recorder = Recorder::default();

    let value = evaluate_with(&record, "(a + b", &recorder);
    assert!(value.is_finite());
    assert_eq!(value, 4.0);
    assert!(!recorder.0.lock().unwrap().is_empty());
}

/// Faults are observed but never raised.
#[test]
fn test_faults_are_reported() {
    let record = DataRecord::new(json!({ "a": 3, "list": [1, 2] }));
    let recorder = Recorder::default();

    assert_eq!(resolve_with(&record, "list", &recorder), Resolved::NotFound);
    assert_eq!(evaluate_with(&record, "a : 0", &recorder), 0.0);

    let faults = recorder.0.lock().unwrap();
    assert!(matches!(faults[0], Fault::Unsupported { .. }));
    assert!(matches!(faults[1], Fault::DivisionByZero { .. }));
}

/// Every row has exactly one cell per key.
#[test]
fn test_row_length_matches_keys() {
    let list: Vec<Input<Value>> = (0..5)
        .map(|i| Input::Single(json!({ "dogs": i, "cats": i * 3, "rabbits": { "young": i } })))
        .collect();
    let keys = ["dogs", "cats", "cats - dogs", "rabbits/young", "missing"];

    let table = as_table(&list, &TableConfig::new(keys)).unwrap();
    assert_eq!(table.len(), 5);
    assert!(table.rows.iter().all(|row| row.len() == keys.len()));
}

/// Delta mode differences each row against the previous raw row.
#[test]
fn test_delta_table() {
    let values = [5.0, 9.0, 4.0];
    let list: Vec<_> = values
        .iter()
        .map(|v| Input::Single(json!({ "k": v })))
        .collect();

    let table = as_table(&list, &TableConfig::new(["k"]).delta(true)).unwrap();
    assert_eq!(
        table.rows,
        vec![
            vec![Cell::Number(values[0])],
            vec![Cell::Number(values[1] - values[0])],
            vec![Cell::Number(values[2] - values[1])],
        ]
    );
}

/// Configuration errors produce no table.
#[test]
fn test_configuration_errors() {
    let list = vec![Input::Single(json!({ "k": 1 }))];

    let err = as_table(&list, &TableConfig::from_json("{}").unwrap()).unwrap_err();
    assert_eq!(err, CrunchError::MissingKeys);
    assert!(err.is_configuration());

    let config = TableConfig::new(["k"]).delta(true).str_fmt("%d");
    assert_eq!(as_table(&list, &config), Err(CrunchError::DeltaWithFormat));
    assert!(TableBuilder::new(config).is_err());

    let config = TableConfig::new(["k"]).str_fmt("%99999999999999999d");
    assert_eq!(
        as_table(&list, &config),
        Err(CrunchError::InvalidFormat("%99999999999999999d".into()))
    );
}
