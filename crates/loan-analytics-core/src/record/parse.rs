use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::record::LoanRecord;
use crate::types::Money;
use crate::LoanAnalyticsError;

// ---------------------------------------------------------------------------
// Schema configuration
// ---------------------------------------------------------------------------

/// Column mapping and date format for the uploaded table. Spreadsheet
/// exports rarely agree on headers, so every name is configurable and a
/// partial config file only overrides the fields it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// chrono format string applied to both date columns
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_loan_id_column")]
    pub loan_id_column: String,
    #[serde(default = "default_disbursed_column")]
    pub disbursed_column: String,
    #[serde(default = "default_setup_fee_column")]
    pub setup_fee_column: String,
    #[serde(default = "default_disbursement_date_column")]
    pub disbursement_date_column: String,
    #[serde(default = "default_due_date_column")]
    pub due_date_column: String,
    #[serde(default = "default_recovered_column")]
    pub recovered_column: String,
    #[serde(default = "default_outstanding_column")]
    pub outstanding_column: String,
    #[serde(default = "default_gender_column")]
    pub gender_column: String,
    #[serde(default = "default_account_type_column")]
    pub account_type_column: String,
    #[serde(default = "default_customer_segment_column")]
    pub customer_segment_column: String,
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}
fn default_loan_id_column() -> String {
    "loan_id".to_string()
}
fn default_disbursed_column() -> String {
    "disbursed_amount".to_string()
}
fn default_setup_fee_column() -> String {
    "setup_fee".to_string()
}
fn default_disbursement_date_column() -> String {
    "disbursement_date".to_string()
}
fn default_due_date_column() -> String {
    "due_date".to_string()
}
fn default_recovered_column() -> String {
    "recovered_amount".to_string()
}
fn default_outstanding_column() -> String {
    "outstanding_balance".to_string()
}
fn default_gender_column() -> String {
    "gender".to_string()
}
fn default_account_type_column() -> String {
    "account_type".to_string()
}
fn default_customer_segment_column() -> String {
    "customer_segment".to_string()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        SchemaConfig {
            date_format: default_date_format(),
            loan_id_column: default_loan_id_column(),
            disbursed_column: default_disbursed_column(),
            setup_fee_column: default_setup_fee_column(),
            disbursement_date_column: default_disbursement_date_column(),
            due_date_column: default_due_date_column(),
            recovered_column: default_recovered_column(),
            outstanding_column: default_outstanding_column(),
            gender_column: default_gender_column(),
            account_type_column: default_account_type_column(),
            customer_segment_column: default_customer_segment_column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw rows and row-level issues
// ---------------------------------------------------------------------------

/// A string-typed row exactly as a spreadsheet parser hands it over.
/// Missing cells are None; nothing has been validated yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLoanRecord {
    pub loan_id: Option<String>,
    pub disbursed_amount: Option<String>,
    pub setup_fee: Option<String>,
    pub disbursement_date: Option<String>,
    pub due_date: Option<String>,
    pub recovered_amount: Option<String>,
    pub outstanding_balance: Option<String>,
    pub gender: Option<String>,
    pub account_type: Option<String>,
    pub customer_segment: Option<String>,
}

/// One malformed field in one row. Collected, never fatal to the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub field: String,
    pub reason: String,
}

impl From<RowIssue> for LoanAnalyticsError {
    fn from(issue: RowIssue) -> Self {
        LoanAnalyticsError::RowValidation {
            row: issue.row,
            field: issue.field,
            reason: issue.reason,
        }
    }
}

/// Result of parsing a batch of raw rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub records: Vec<LoanRecord>,
    pub issues: Vec<RowIssue>,
    pub rows_seen: usize,
    pub rows_rejected: usize,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Convert raw string rows into typed records. A row with any malformed
/// required field is rejected and every bad field in it is reported; the
/// caller decides whether to surface or drop the issues.
pub fn parse_records(rows: &[RawLoanRecord], schema: &SchemaConfig) -> ParseOutcome {
    let mut records = Vec::with_capacity(rows.len());
    let mut issues = Vec::new();
    let mut rows_rejected = 0usize;

    for (idx, raw) in rows.iter().enumerate() {
        let row = idx + 1;
        let before = issues.len();

        let loan_id = match raw.loan_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => {
                issues.push(RowIssue {
                    row,
                    field: schema.loan_id_column.clone(),
                    reason: "missing loan identifier".to_string(),
                });
                None
            }
        };

        let disbursed = parse_required_money(
            raw.disbursed_amount.as_deref(),
            row,
            &schema.disbursed_column,
            &mut issues,
        );
        let setup_fee = parse_optional_money(
            raw.setup_fee.as_deref(),
            row,
            &schema.setup_fee_column,
            &mut issues,
        );
        let recovered = parse_required_money(
            raw.recovered_amount.as_deref(),
            row,
            &schema.recovered_column,
            &mut issues,
        );
        let disbursement_date = parse_date(
            raw.disbursement_date.as_deref(),
            row,
            &schema.disbursement_date_column,
            &schema.date_format,
            &mut issues,
        );
        let due_date = parse_date(
            raw.due_date.as_deref(),
            row,
            &schema.due_date_column,
            &schema.date_format,
            &mut issues,
        );

        // Outstanding may be absent; derive it from the pair when so.
        let outstanding = match raw.outstanding_balance.as_deref().map(str::trim) {
            None | Some("") => disbursed.zip(recovered).map(|(d, r)| d - r),
            Some(text) => match parse_money(text) {
                Ok(value) => Some(value),
                Err(reason) => {
                    issues.push(RowIssue {
                        row,
                        field: schema.outstanding_column.clone(),
                        reason,
                    });
                    None
                }
            },
        };

        if issues.len() > before {
            rows_rejected += 1;
            continue;
        }

        match (loan_id, disbursed, recovered, disbursement_date, due_date, outstanding) {
            (Some(loan_id), Some(disbursed), Some(recovered), Some(dd), Some(due), Some(out)) => {
                records.push(LoanRecord {
                    loan_id,
                    disbursed_amount: disbursed,
                    setup_fee: setup_fee.unwrap_or(Decimal::ZERO),
                    disbursement_date: dd,
                    due_date: due,
                    recovered_amount: recovered,
                    outstanding_balance: out,
                    gender: clean_category(raw.gender.as_deref()),
                    account_type: clean_category(raw.account_type.as_deref()),
                    customer_segment: clean_category(raw.customer_segment.as_deref()),
                });
            }
            _ => rows_rejected += 1,
        }
    }

    ParseOutcome {
        records,
        issues,
        rows_seen: rows.len(),
        rows_rejected,
    }
}

/// Parse a monetary cell, tolerating thousands separators.
fn parse_money(raw: &str) -> Result<Money, String> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err("empty value".to_string());
    }
    Decimal::from_str(&cleaned).map_err(|_| format!("'{}' is not a number", raw.trim()))
}

fn parse_required_money(
    cell: Option<&str>,
    row: usize,
    field: &str,
    issues: &mut Vec<RowIssue>,
) -> Option<Money> {
    match cell.map(str::trim) {
        None | Some("") => {
            issues.push(RowIssue {
                row,
                field: field.to_string(),
                reason: "missing value".to_string(),
            });
            None
        }
        Some(text) => match parse_money(text) {
            Ok(value) => Some(value),
            Err(reason) => {
                issues.push(RowIssue {
                    row,
                    field: field.to_string(),
                    reason,
                });
                None
            }
        },
    }
}

fn parse_optional_money(
    cell: Option<&str>,
    row: usize,
    field: &str,
    issues: &mut Vec<RowIssue>,
) -> Option<Money> {
    match cell.map(str::trim) {
        None | Some("") => Some(Decimal::ZERO),
        Some(text) => match parse_money(text) {
            Ok(value) => Some(value),
            Err(reason) => {
                issues.push(RowIssue {
                    row,
                    field: field.to_string(),
                    reason,
                });
                None
            }
        },
    }
}

fn parse_date(
    cell: Option<&str>,
    row: usize,
    field: &str,
    format: &str,
    issues: &mut Vec<RowIssue>,
) -> Option<NaiveDate> {
    match cell.map(str::trim) {
        None | Some("") => {
            issues.push(RowIssue {
                row,
                field: field.to_string(),
                reason: "missing date".to_string(),
            });
            None
        }
        Some(text) => match NaiveDate::parse_from_str(text, format) {
            Ok(date) => Some(date),
            Err(_) => {
                issues.push(RowIssue {
                    row,
                    field: field.to_string(),
                    reason: format!("'{}' does not match date format {}", text, format),
                });
                None
            }
        },
    }
}

fn clean_category(cell: Option<&str>) -> Option<String> {
    match cell.map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(text.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
