//! Periods example: reducing groups of records to rows
//!
//! This example demonstrates:
//! - Feeding pre-bucketed periods into a table
//! - Choosing a reducer
//! - Formatting dates and values

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use statcrunch::*;

fn main() -> Result<(), CrunchError> {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or_default();

    // Two weeks of daily figures, bucketed by week outside of this crate.
    let daily: Vec<DataRecord> = (0..14)
        .map(|day| {
            DataRecord::new(json!({
                "orders": { "count": 5 + day % 4, "lines": 12 + day },
                "revenue": { "EUR": 100.0 + 7.5 * day as f64 }
            }))
            .with_created_at(start + Duration::days(day))
        })
        .collect();
    let weeks: Vec<Input<DataRecord>> = daily
        .chunks(7)
        .map(|week| Input::Period(week.to_vec()))
        .collect();

    for reducer in [ReducerKind::Sum, ReducerKind::Mean, ReducerKind::Stddev] {
        let config = TableConfig::new(["date", "orders/count", "revenue/EUR : orders/lines"])
            .list_operator(reducer)
            .date_fmt("week %V")
            .str_fmt("%8.2f");

        println!("=== {} ===", reducer);
        for row in as_table(&weeks, &config)?.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            println!("  {}", cells.join(" | "));
        }
    }

    Ok(())
}
