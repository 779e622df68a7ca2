use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_analytics_core::record::audit::{audit_records, DEFAULT_BALANCE_TOLERANCE};
use loan_analytics_core::record::parse::parse_records;

use crate::input::records::{load_raw_rows, load_schema};

/// Arguments for upload validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Raw spreadsheet export: .csv, or JSON/YAML rows with string cells
    #[arg(long)]
    pub input: String,

    /// Schema config (.json or .yaml) mapping column names and date format
    #[arg(long)]
    pub schema: Option<String>,

    /// Absolute balance mismatch tolerated before a record is flagged
    #[arg(long)]
    pub tolerance: Option<Decimal>,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schema = load_schema(&args.schema)?;
    let rows = load_raw_rows(&args.input, &schema)?;
    let outcome = parse_records(&rows, &schema);

    // A fully-rejected upload still reports its row issues; the audit only
    // runs over whatever parsed.
    let audit = if outcome.records.is_empty() {
        Value::Null
    } else {
        let tolerance = args.tolerance.unwrap_or(DEFAULT_BALANCE_TOLERANCE);
        serde_json::to_value(audit_records(&outcome.records, tolerance)?)?
    };

    Ok(serde_json::json!({
        "rows_seen": outcome.rows_seen,
        "rows_parsed": outcome.records.len(),
        "rows_rejected": outcome.rows_rejected,
        "row_issues": outcome.issues,
        "audit": audit,
    }))
}
