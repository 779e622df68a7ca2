use chrono::NaiveDate;
use loan_analytics_core::analytics::summary::compute_summary;
use loan_analytics_core::analytics::trend::{
    compute_period_change, compute_trend, TimeBucket,
};
use loan_analytics_core::record::LoanRecord;
use loan_analytics_core::LoanAnalyticsError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Shared fixture: a small microfinance book spanning Q1 2024
// ===========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn loan(
    id: &str,
    disbursed: Decimal,
    fee: Decimal,
    recovered: Decimal,
    disbursed_on: NaiveDate,
) -> LoanRecord {
    LoanRecord {
        loan_id: id.to_string(),
        disbursed_amount: disbursed,
        setup_fee: fee,
        disbursement_date: disbursed_on,
        due_date: disbursed_on + chrono::Duration::days(90),
        recovered_amount: recovered,
        outstanding_balance: disbursed - recovered,
        gender: None,
        account_type: None,
        customer_segment: None,
    }
}

fn q1_book() -> Vec<LoanRecord> {
    vec![
        loan("LN-001", dec!(1000), dec!(20), dec!(600), date(2024, 1, 8)),
        loan("LN-002", dec!(1500), dec!(30), dec!(900), date(2024, 1, 22)),
        loan("LN-003", dec!(2000), dec!(40), dec!(400), date(2024, 2, 5)),
        loan("LN-004", dec!(500), dec!(10), dec!(500), date(2024, 2, 19)),
        loan("LN-005", dec!(3000), dec!(60), dec!(0), date(2024, 3, 4)),
        loan("LN-006", dec!(1250), dec!(25), dec!(125), date(2024, 3, 28)),
    ]
}

// ===========================================================================
// Summary
// ===========================================================================

#[test]
fn test_summary_totals_over_book() {
    let out = compute_summary(&q1_book()).unwrap();
    let s = &out.result;

    assert_eq!(s.loan_count, 6);
    assert_eq!(s.total_disbursed, dec!(9250));
    assert_eq!(s.total_setup_fees, dec!(185));
    assert_eq!(s.total_recovered, dec!(2525));
    assert_eq!(s.total_outstanding, dec!(6725));
    assert_eq!(s.recovery_rate, dec!(2525) / dec!(9250));
    assert!(s.recovery_rate > Decimal::ZERO && s.recovery_rate < Decimal::ONE);
}

#[test]
fn test_summary_matches_trend_totals() {
    let book = q1_book();
    let summary = compute_summary(&book).unwrap().result;
    let trend = compute_trend(&book, TimeBucket::Month, false).unwrap().result;

    let trended_disbursed: Decimal = trend.points.iter().map(|p| p.disbursed).sum();
    let trended_recovered: Decimal = trend.points.iter().map(|p| p.recovered).sum();
    let trended_count: u32 = trend.points.iter().map(|p| p.loan_count).sum();

    assert_eq!(trended_disbursed, summary.total_disbursed);
    assert_eq!(trended_recovered, summary.total_recovered);
    assert_eq!(trended_count, summary.loan_count);
}

// ===========================================================================
// Trend
// ===========================================================================

#[test]
fn test_monthly_trend_over_book() {
    let out = compute_trend(&q1_book(), TimeBucket::Month, false).unwrap();
    let points = &out.result.points;

    assert_eq!(points.len(), 3);
    assert_eq!(points[0].period, "2024-01");
    assert_eq!(points[0].disbursed, dec!(2500));
    assert_eq!(points[0].recovered, dec!(1500));
    assert_eq!(points[1].period, "2024-02");
    assert_eq!(points[1].disbursed, dec!(2500));
    assert_eq!(points[2].period, "2024-03");
    assert_eq!(points[2].disbursed, dec!(4250));
}

#[test]
fn test_yearly_trend_collapses_book() {
    let out = compute_trend(&q1_book(), TimeBucket::Year, false).unwrap();
    assert_eq!(out.result.points.len(), 1);
    assert_eq!(out.result.points[0].period, "2024");
    assert_eq!(out.result.points[0].loan_count, 6);
}

// ===========================================================================
// Period-over-period change
// ===========================================================================

#[test]
fn test_monthly_change_over_book() {
    let out = compute_period_change(&q1_book(), TimeBucket::Month).unwrap();
    let points = &out.result.points;

    assert_eq!(points.len(), 2);
    // Feb vs Jan: disbursed 2500 -> 2500
    assert_eq!(points[0].period, "2024-02");
    assert_eq!(points[0].disbursed_change, Some(Decimal::ZERO));
    // Feb vs Jan: recovered 1500 -> 900 = -40%
    assert_eq!(points[0].recovered_change, Some(dec!(-0.4)));
    // Mar vs Feb: disbursed 2500 -> 4250 = +70%
    assert_eq!(points[1].period, "2024-03");
    assert_eq!(points[1].disbursed_change, Some(dec!(0.7)));
    // Mar vs Feb: fees 50 -> 85 = +70%
    assert_eq!(points[1].setup_fee_change, Some(dec!(0.7)));
}

#[test]
fn test_change_rejects_single_period_book() {
    let book = vec![
        loan("LN-001", dec!(1000), dec!(20), dec!(0), date(2024, 1, 8)),
        loan("LN-002", dec!(1500), dec!(30), dec!(0), date(2024, 1, 22)),
    ];
    let err = compute_period_change(&book, TimeBucket::Month).unwrap_err();
    assert!(matches!(err, LoanAnalyticsError::InsufficientData(_)));
}

// ===========================================================================
// Purity
// ===========================================================================

#[test]
fn test_results_identical_across_reruns() {
    let book = q1_book();

    let summary_a = serde_json::to_string(&compute_summary(&book).unwrap().result).unwrap();
    let summary_b = serde_json::to_string(&compute_summary(&book).unwrap().result).unwrap();
    assert_eq!(summary_a, summary_b);

    let trend_a =
        serde_json::to_string(&compute_trend(&book, TimeBucket::Day, false).unwrap().result)
            .unwrap();
    let trend_b =
        serde_json::to_string(&compute_trend(&book, TimeBucket::Day, false).unwrap().result)
            .unwrap();
    assert_eq!(trend_a, trend_b);
}

#[test]
fn test_input_not_mutated() {
    let book = q1_book();
    let before = serde_json::to_string(&book).unwrap();
    let _ = compute_summary(&book).unwrap();
    let _ = compute_trend(&book, TimeBucket::Month, true).unwrap();
    let after = serde_json::to_string(&book).unwrap();
    assert_eq!(before, after);
}
