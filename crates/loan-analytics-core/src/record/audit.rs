use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::record::LoanRecord;
use crate::types::*;
use crate::{LoanAnalyticsError, LoanAnalyticsResult};

/// Absolute mismatch below this is treated as rounding noise.
pub const DEFAULT_BALANCE_TOLERANCE: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditIssueKind {
    /// outstanding_balance disagrees with disbursed - recovered
    BalanceMismatch,
    /// due_date falls before disbursement_date
    InvertedDates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditIssue {
    pub loan_id: String,
    /// 1-based position in the audited slice
    pub row: usize,
    pub kind: AuditIssueKind,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditOutput {
    pub records_checked: u32,
    pub balance_mismatches: u32,
    pub inverted_date_pairs: u32,
    pub issues: Vec<AuditIssue>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check every record against the book-keeping invariants: the outstanding
/// balance must equal disbursed minus recovered (within `tolerance`) and the
/// due date must not precede the disbursement date. Violations are flagged,
/// never repaired.
pub fn audit_records(
    records: &[LoanRecord],
    tolerance: Money,
) -> LoanAnalyticsResult<ComputationOutput<AuditOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if records.is_empty() {
        return Err(LoanAnalyticsError::EmptyDataset(
            "no loan records to audit".into(),
        ));
    }
    if tolerance < Decimal::ZERO {
        return Err(LoanAnalyticsError::InvalidInput {
            field: "tolerance".into(),
            reason: "Balance tolerance cannot be negative.".into(),
        });
    }

    let mut issues: Vec<AuditIssue> = Vec::new();
    let mut balance_mismatches = 0u32;
    let mut inverted_date_pairs = 0u32;

    for (idx, record) in records.iter().enumerate() {
        let row = idx + 1;

        let implied = record.implied_outstanding();
        let gap = (record.outstanding_balance - implied).abs();
        if gap > tolerance {
            balance_mismatches += 1;
            issues.push(AuditIssue {
                loan_id: record.loan_id.clone(),
                row,
                kind: AuditIssueKind::BalanceMismatch,
                detail: format!(
                    "outstanding {} but disbursed - recovered = {}",
                    record.outstanding_balance, implied
                ),
            });
        }

        if record.due_date < record.disbursement_date {
            inverted_date_pairs += 1;
            issues.push(AuditIssue {
                loan_id: record.loan_id.clone(),
                row,
                kind: AuditIssueKind::InvertedDates,
                detail: format!(
                    "due {} precedes disbursement {}",
                    record.due_date, record.disbursement_date
                ),
            });
        }
    }

    if !issues.is_empty() {
        warnings.push(format!(
            "{} of {} records failed data-quality checks.",
            issues.len(),
            records.len()
        ));
    }

    let output = AuditOutput {
        records_checked: records.len() as u32,
        balance_mismatches,
        inverted_date_pairs,
        issues,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "balance_identity": "outstanding = disbursed - recovered",
        "tolerance": tolerance.to_string(),
    });

    Ok(with_metadata(
        "Loan book data-quality audit",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn consistent_record(id: &str) -> LoanRecord {
        LoanRecord {
            loan_id: id.to_string(),
            disbursed_amount: dec!(1000),
            setup_fee: dec!(25),
            disbursement_date: date(2024, 1, 5),
            due_date: date(2024, 3, 5),
            recovered_amount: dec!(400),
            outstanding_balance: dec!(600),
            gender: None,
            account_type: None,
            customer_segment: None,
        }
    }

    #[test]
    fn test_consistent_book_is_clean() {
        let records = vec![consistent_record("LN-001"), consistent_record("LN-002")];
        let out = audit_records(&records, DEFAULT_BALANCE_TOLERANCE).unwrap();

        assert!(out.result.issues.is_empty());
        assert_eq!(out.result.records_checked, 2);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_balance_mismatch_flagged() {
        let mut bad = consistent_record("LN-002");
        bad.outstanding_balance = dec!(650);
        let records = vec![consistent_record("LN-001"), bad];

        let out = audit_records(&records, DEFAULT_BALANCE_TOLERANCE).unwrap();
        let issues = &out.result.issues;

        assert_eq!(out.result.balance_mismatches, 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].loan_id, "LN-002");
        assert_eq!(issues[0].row, 2);
        assert_eq!(issues[0].kind, AuditIssueKind::BalanceMismatch);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_mismatch_within_tolerance_ignored() {
        let mut rounding = consistent_record("LN-001");
        rounding.outstanding_balance = dec!(600.005);
        let out = audit_records(&[rounding], DEFAULT_BALANCE_TOLERANCE).unwrap();
        assert!(out.result.issues.is_empty());
    }

    #[test]
    fn test_inverted_dates_flagged() {
        let mut bad = consistent_record("LN-001");
        bad.due_date = date(2023, 12, 1);
        let out = audit_records(&[bad], DEFAULT_BALANCE_TOLERANCE).unwrap();

        assert_eq!(out.result.inverted_date_pairs, 1);
        assert_eq!(out.result.issues[0].kind, AuditIssueKind::InvertedDates);
    }

    #[test]
    fn test_empty_book_rejected() {
        let err = audit_records(&[], DEFAULT_BALANCE_TOLERANCE).unwrap_err();
        assert!(matches!(err, LoanAnalyticsError::EmptyDataset(_)));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let records = vec![consistent_record("LN-001")];
        let err = audit_records(&records, dec!(-1)).unwrap_err();
        assert!(matches!(err, LoanAnalyticsError::InvalidInput { .. }));
    }
}
