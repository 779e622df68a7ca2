use clap::Args;
use colored::Colorize;

use loan_analytics_core::record::parse::{
    parse_records, ParseOutcome, RawLoanRecord, SchemaConfig,
};
use loan_analytics_core::record::LoanRecord;

use crate::input::{file, stdin};

/// Shared source flags for every analytics subcommand.
#[derive(Args)]
pub struct SourceArgs {
    /// Records file: .csv (raw spreadsheet export), .json or .yaml (typed
    /// records). Piped JSON on stdin is used when omitted.
    #[arg(long)]
    pub input: Option<String>,

    /// Schema config (.json or .yaml) mapping CSV column names and the
    /// date format. Defaults cover a conventional export.
    #[arg(long)]
    pub schema: Option<String>,
}

/// Load the schema config, or defaults when no file is given.
pub fn load_schema(path: &Option<String>) -> Result<SchemaConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => file::read_structured(p),
        None => Ok(SchemaConfig::default()),
    }
}

/// Load typed loan records from the configured source. CSV rows go through
/// row-level validation; rejected rows are reported on stderr and excluded.
pub fn load_records(args: &SourceArgs) -> Result<Vec<LoanRecord>, Box<dyn std::error::Error>> {
    let records = match &args.input {
        Some(path) if path.to_ascii_lowercase().ends_with(".csv") => {
            let schema = load_schema(&args.schema)?;
            let rows = read_csv_rows(path, &schema)?;
            let outcome = parse_records(&rows, &schema);
            report_row_issues(&outcome);
            outcome.records
        }
        Some(path) => file::read_structured(path)?,
        None => match stdin::read_stdin::<Vec<LoanRecord>>()? {
            Some(records) => records,
            None => {
                return Err(
                    "no input: provide --input FILE or pipe a JSON array of records".into(),
                )
            }
        },
    };
    Ok(records)
}

/// Load raw string rows for the validate command.
pub fn load_raw_rows(
    path: &str,
    schema: &SchemaConfig,
) -> Result<Vec<RawLoanRecord>, Box<dyn std::error::Error>> {
    if path.to_ascii_lowercase().ends_with(".csv") {
        read_csv_rows(path, schema)
    } else {
        file::read_structured(path)
    }
}

fn report_row_issues(outcome: &ParseOutcome) {
    for issue in &outcome.issues {
        eprintln!(
            "{}: row {} column '{}': {}",
            "warning".yellow().bold(),
            issue.row,
            issue.field,
            issue.reason
        );
    }
    if outcome.rows_rejected > 0 {
        eprintln!(
            "{}: {} of {} rows excluded from the analysis",
            "warning".yellow().bold(),
            outcome.rows_rejected,
            outcome.rows_seen
        );
    }
}

/// Read a CSV export into raw rows using the schema's column names.
/// Header matching is case-insensitive; optional columns may be absent.
fn read_csv_rows(
    path: &str,
    schema: &SchemaConfig,
) -> Result<Vec<RawLoanRecord>, Box<dyn std::error::Error>> {
    let canonical = file::resolve_path(path)?;
    let mut reader = csv::Reader::from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    let headers = reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let loan_id = find(&schema.loan_id_column);
    let disbursed = find(&schema.disbursed_column);
    let setup_fee = find(&schema.setup_fee_column);
    let disbursement_date = find(&schema.disbursement_date_column);
    let due_date = find(&schema.due_date_column);
    let recovered = find(&schema.recovered_column);
    let outstanding = find(&schema.outstanding_column);
    let gender = find(&schema.gender_column);
    let account_type = find(&schema.account_type_column);
    let customer_segment = find(&schema.customer_segment_column);

    for (col, name) in [
        (loan_id, &schema.loan_id_column),
        (disbursed, &schema.disbursed_column),
        (disbursement_date, &schema.disbursement_date_column),
        (due_date, &schema.due_date_column),
        (recovered, &schema.recovered_column),
    ] {
        if col.is_none() {
            return Err(format!(
                "CSV is missing required column '{}' (map column names with --schema)",
                name
            )
            .into());
        }
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cell = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        rows.push(RawLoanRecord {
            loan_id: cell(loan_id),
            disbursed_amount: cell(disbursed),
            setup_fee: cell(setup_fee),
            disbursement_date: cell(disbursement_date),
            due_date: cell(due_date),
            recovered_amount: cell(recovered),
            outstanding_balance: cell(outstanding),
            gender: cell(gender),
            account_type: cell(account_type),
            customer_segment: cell(customer_segment),
        });
    }
    Ok(rows)
}
