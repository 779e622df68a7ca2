use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::record::LoanRecord;
use crate::types::*;
use crate::{LoanAnalyticsError, LoanAnalyticsResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Calendar bucket for trend series. Records are keyed on their
/// disbursement date; recovered amounts are attributed to the period the
/// loan was originated in, matching how the book is reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Day,
    Month,
    Year,
}

impl TimeBucket {
    /// First day of the bucket containing `date`.
    fn floor(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => date,
            TimeBucket::Month => date.with_day(1).unwrap_or(date),
            TimeBucket::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// Human label for a bucket start, e.g. "2024-03" for a month.
    fn label(&self, start: NaiveDate) -> String {
        match self {
            TimeBucket::Day => start.format("%Y-%m-%d").to_string(),
            TimeBucket::Month => start.format("%Y-%m").to_string(),
            TimeBucket::Year => start.format("%Y").to_string(),
        }
    }

    /// Start of the bucket immediately after `start`.
    fn advance(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeBucket::Day => start.succ_opt(),
            TimeBucket::Month => {
                if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
                }
            }
            TimeBucket::Year => NaiveDate::from_ymd_opt(start.year() + 1, 1, 1),
        }
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimeBucket::Day => "day",
            TimeBucket::Month => "month",
            TimeBucket::Year => "year",
        };
        write!(f, "{}", s)
    }
}

/// One calendar bucket of the disbursement/recovery series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub period_start: NaiveDate,
    pub disbursed: Money,
    pub setup_fees: Money,
    pub recovered: Money,
    pub loan_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendOutput {
    pub bucket: TimeBucket,
    pub points: Vec<TrendPoint>,
}

/// Period-over-period percentage change, as decimal fractions (0.25 = +25%).
/// A change is None when the prior period's value is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodChangePoint {
    pub period: String,
    pub disbursed_change: Option<Rate>,
    pub setup_fee_change: Option<Rate>,
    pub recovered_change: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodChangeOutput {
    pub bucket: TimeBucket,
    pub points: Vec<PeriodChangePoint>,
}

// ---------------------------------------------------------------------------
// Internal accumulation
// ---------------------------------------------------------------------------

#[derive(Default, Clone, Copy)]
struct BucketAcc {
    disbursed: Decimal,
    setup_fees: Decimal,
    recovered: Decimal,
    loan_count: u32,
}

fn bucketize(records: &[LoanRecord], bucket: TimeBucket) -> BTreeMap<NaiveDate, BucketAcc> {
    let mut buckets: BTreeMap<NaiveDate, BucketAcc> = BTreeMap::new();
    for record in records {
        let acc = buckets
            .entry(bucket.floor(record.disbursement_date))
            .or_default();
        acc.disbursed += record.disbursed_amount;
        acc.setup_fees += record.setup_fee;
        acc.recovered += record.recovered_amount;
        acc.loan_count += 1;
    }
    buckets
}

fn point(bucket: TimeBucket, start: NaiveDate, acc: BucketAcc) -> TrendPoint {
    TrendPoint {
        period: bucket.label(start),
        period_start: start,
        disbursed: acc.disbursed,
        setup_fees: acc.setup_fees,
        recovered: acc.recovered,
        loan_count: acc.loan_count,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Group the book into a chronological disbursement/recovery series.
/// Periods with no records are omitted unless `zero_fill` is set, in which
/// case interior gaps between the first and last observed periods are
/// emitted with zero amounts.
pub fn compute_trend(
    records: &[LoanRecord],
    bucket: TimeBucket,
    zero_fill: bool,
) -> LoanAnalyticsResult<ComputationOutput<TrendOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if records.is_empty() {
        return Err(LoanAnalyticsError::EmptyDataset(
            "no loan records to build a trend from".into(),
        ));
    }

    let buckets = bucketize(records, bucket);

    let points: Vec<TrendPoint> = if zero_fill {
        // BTreeMap is non-empty here, so first/last keys exist.
        let first = *buckets.keys().next().unwrap_or(&NaiveDate::MIN);
        let last = *buckets.keys().next_back().unwrap_or(&NaiveDate::MIN);
        let mut filled = Vec::new();
        let mut cursor = first;
        loop {
            let acc = buckets.get(&cursor).copied().unwrap_or_default();
            filled.push(point(bucket, cursor, acc));
            if cursor >= last {
                break;
            }
            match bucket.advance(cursor) {
                Some(next) => cursor = next,
                None => {
                    return Err(LoanAnalyticsError::DateError(format!(
                        "cannot advance past {}",
                        cursor
                    )))
                }
            }
        }
        filled
    } else {
        buckets
            .into_iter()
            .map(|(bucket_start, acc)| point(bucket, bucket_start, acc))
            .collect()
    };

    let output = TrendOutput { bucket, points };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "period_key": "disbursement date",
        "zero_fill": zero_fill,
    });

    Ok(with_metadata(
        "Disbursement and recovery trend",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Percentage change of disbursed, setup fees and recovered between each
/// pair of consecutive observed periods. The first period has no prior and
/// is not emitted.
pub fn compute_period_change(
    records: &[LoanRecord],
    bucket: TimeBucket,
) -> LoanAnalyticsResult<ComputationOutput<PeriodChangeOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if records.is_empty() {
        return Err(LoanAnalyticsError::EmptyDataset(
            "no loan records to compare across periods".into(),
        ));
    }

    let buckets = bucketize(records, bucket);
    if buckets.len() < 2 {
        return Err(LoanAnalyticsError::InsufficientData(format!(
            "period-over-period change needs at least two {} buckets, found {}",
            bucket,
            buckets.len()
        )));
    }

    let series: Vec<(NaiveDate, BucketAcc)> = buckets.into_iter().collect();
    let mut points = Vec::with_capacity(series.len() - 1);
    for pair in series.windows(2) {
        let (_, prev) = pair[0];
        let (cur_start, cur) = pair[1];
        points.push(PeriodChangePoint {
            period: bucket.label(cur_start),
            disbursed_change: pct_change(prev.disbursed, cur.disbursed),
            setup_fee_change: pct_change(prev.setup_fees, cur.setup_fees),
            recovered_change: pct_change(prev.recovered, cur.recovered),
        });
    }

    let output = PeriodChangeOutput { bucket, points };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "change": "(current - previous) / previous, null when previous is zero",
        "periods": "observed periods only; gaps are not zero-filled",
    });

    Ok(with_metadata(
        "Period-over-period change",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn pct_change(prev: Decimal, cur: Decimal) -> Option<Rate> {
    if prev.is_zero() {
        None
    } else {
        Some((cur - prev) / prev)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
