//! Basic example: a table over single records
//!
//! This example demonstrates:
//! - Fetching plain keys and deep paths
//! - Evaluating expressions
//! - Building a table with row differencing

use serde_json::json;
use statcrunch::*;

fn main() -> Result<(), CrunchError> {
    let record = DataRecord::new(json!({
        "doors": 10,
        "keys": 8,
        "loans": { "requested": { "GBP": 0.65395 }, "payed": { "GBP": 145.23 } }
    }));

    println!("Fetching values:");
    println!("  doors               = {:?}", resolve(&record, "doors"));
    println!("  loans/requested/GBP = {:?}", resolve(&record, "loans/requested/GBP"));
    println!("  keys - doors        = {}", evaluate(&record, "keys - doors"));
    println!(
        "  (keys + doors) : 4  = {}",
        evaluate(&record, "(keys + doors) : 4")
    );

    let list: Vec<Input<DataRecord>> = [(10, 8), (12, 15), (9, 20)]
        .into_iter()
        .map(|(doors, keys)| Input::Single(DataRecord::new(json!({ "doors": doors, "keys": keys }))))
        .collect();

    let config = TableConfig::new(["doors", "keys", "keys - doors"]);
    println!("\n=== Table ===");
    for row in as_table(&list, &config)?.rows {
        println!("  {:?}", row);
    }

    println!("\n=== Delta Table ===");
    for row in as_table(&list, &config.delta(true))?.rows {
        println!("  {:?}", row);
    }

    Ok(())
}
