use serde_json::Value;
use std::io;

use crate::output::SERIES_KEYS;

/// Write output as CSV to stdout. Envelopes holding a series (trend
/// points, segments, DPD bands...) emit the series row-per-item, which is
/// what a charting pipeline wants; anything else falls back to field,value
/// pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => {
                    write_fields_csv(&mut wtr, map);
                    let _ = wtr.flush();
                    return;
                }
            };

            match primary_series(result) {
                Some(series) => write_array_csv(&mut wtr, series),
                None => write_fields_csv(&mut wtr, result),
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// First non-empty series in the result, in declaration order.
fn primary_series(result: &serde_json::Map<String, Value>) -> Option<&Vec<Value>> {
    SERIES_KEYS.iter().find_map(|key| match result.get(*key) {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    })
}

fn write_fields_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
