use loan_analytics_core::record::audit::{audit_records, AuditIssueKind, DEFAULT_BALANCE_TOLERANCE};
use loan_analytics_core::record::parse::{parse_records, RawLoanRecord, SchemaConfig};
use rust_decimal_macros::dec;

fn raw(id: &str, disbursed: &str, recovered: &str, outstanding: Option<&str>) -> RawLoanRecord {
    RawLoanRecord {
        loan_id: Some(id.to_string()),
        disbursed_amount: Some(disbursed.to_string()),
        setup_fee: Some("25".to_string()),
        disbursement_date: Some("2024-01-05".to_string()),
        due_date: Some("2024-04-05".to_string()),
        recovered_amount: Some(recovered.to_string()),
        outstanding_balance: outstanding.map(String::from),
        gender: Some("female".to_string()),
        account_type: Some("group".to_string()),
        customer_segment: Some("rural".to_string()),
    }
}

// ===========================================================================
// Parse -> audit pipeline, the shape a spreadsheet upload takes
// ===========================================================================

#[test]
fn test_clean_upload_parses_and_audits_clean() {
    let rows = vec![
        raw("LN-001", "1000", "400", Some("600")),
        raw("LN-002", "2,500.75", "0", None),
    ];
    let outcome = parse_records(&rows, &SchemaConfig::default());
    assert!(outcome.issues.is_empty());
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[1].disbursed_amount, dec!(2500.75));
    assert_eq!(outcome.records[1].outstanding_balance, dec!(2500.75));

    let audit = audit_records(&outcome.records, DEFAULT_BALANCE_TOLERANCE).unwrap();
    assert!(audit.result.issues.is_empty());
}

#[test]
fn test_partial_upload_keeps_good_rows() {
    let rows = vec![
        raw("LN-001", "1000", "400", None),
        raw("LN-002", "not-a-number", "0", None),
        raw("LN-003", "500", "oops", None),
        raw("LN-004", "750", "250", None),
    ];
    let outcome = parse_records(&rows, &SchemaConfig::default());

    assert_eq!(outcome.rows_seen, 4);
    assert_eq!(outcome.rows_rejected, 2);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.issues.len(), 2);

    // Issues carry the spreadsheet row and offending column
    assert_eq!(outcome.issues[0].row, 2);
    assert_eq!(outcome.issues[0].field, "disbursed_amount");
    assert_eq!(outcome.issues[1].row, 3);
    assert_eq!(outcome.issues[1].field, "recovered_amount");
}

#[test]
fn test_renamed_columns_via_schema() {
    let schema = SchemaConfig {
        disbursed_column: "Sum_Set_up_Fee_Principal".to_string(),
        recovered_column: "Sum_Total_Recovered".to_string(),
        ..SchemaConfig::default()
    };
    let rows = vec![RawLoanRecord {
        loan_id: Some("LN-001".to_string()),
        disbursed_amount: Some("bad".to_string()),
        disbursement_date: Some("2024-01-05".to_string()),
        due_date: Some("2024-04-05".to_string()),
        recovered_amount: Some("0".to_string()),
        ..RawLoanRecord::default()
    }];
    let outcome = parse_records(&rows, &schema);
    // The issue reports the configured column name, not the internal field
    assert_eq!(outcome.issues[0].field, "Sum_Set_up_Fee_Principal");
}

#[test]
fn test_audit_flags_drifted_ledger() {
    let rows = vec![
        raw("LN-001", "1000", "400", Some("600")),
        raw("LN-002", "1000", "400", Some("700")),
    ];
    let outcome = parse_records(&rows, &SchemaConfig::default());
    let audit = audit_records(&outcome.records, DEFAULT_BALANCE_TOLERANCE).unwrap();

    assert_eq!(audit.result.balance_mismatches, 1);
    assert_eq!(audit.result.issues[0].loan_id, "LN-002");
    assert_eq!(audit.result.issues[0].kind, AuditIssueKind::BalanceMismatch);
}

#[test]
fn test_audit_flags_due_before_disbursement() {
    let mut row = raw("LN-001", "1000", "0", None);
    row.due_date = Some("2023-12-01".to_string());
    let outcome = parse_records(&[row], &SchemaConfig::default());
    let audit = audit_records(&outcome.records, DEFAULT_BALANCE_TOLERANCE).unwrap();

    assert_eq!(audit.result.inverted_date_pairs, 1);
    assert_eq!(audit.result.issues[0].kind, AuditIssueKind::InvertedDates);
}
