use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Instant;

use crate::record::LoanRecord;
use crate::types::*;
use crate::{LoanAnalyticsError, LoanAnalyticsResult};

/// Bucket key for records whose dimension value is missing or blank.
pub const UNSPECIFIED_SEGMENT: &str = "unspecified";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Categorical dimension the book can be broken down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentDimension {
    Gender,
    AccountType,
    CustomerSegment,
}

impl FromStr for SegmentDimension {
    type Err = LoanAnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gender" => Ok(SegmentDimension::Gender),
            "account-type" | "account_type" => Ok(SegmentDimension::AccountType),
            "customer-segment" | "customer_segment" | "segment" => {
                Ok(SegmentDimension::CustomerSegment)
            }
            other => Err(LoanAnalyticsError::InvalidDimension(other.to_string())),
        }
    }
}

impl std::fmt::Display for SegmentDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SegmentDimension::Gender => "gender",
            SegmentDimension::AccountType => "account-type",
            SegmentDimension::CustomerSegment => "customer-segment",
        };
        write!(f, "{}", s)
    }
}

/// Aggregates for one distinct value of the chosen dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentBreakdown {
    pub key: String,
    pub loan_count: u32,
    pub total_disbursed: Money,
    pub total_recovered: Money,
    pub recovery_rate: Rate,
    /// Segment disbursed as a share of the whole book
    pub share_of_disbursed: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentBreakdownOutput {
    pub dimension: SegmentDimension,
    pub total_records: u32,
    pub unspecified_count: u32,
    pub segments: Vec<SegmentBreakdown>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Break the book down by one categorical dimension. Records with a
/// missing value land in the "unspecified" bucket rather than being
/// dropped, so segment counts always sum to the record count.
pub fn compute_segment_breakdown(
    records: &[LoanRecord],
    dimension: SegmentDimension,
) -> LoanAnalyticsResult<ComputationOutput<SegmentBreakdownOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if records.is_empty() {
        return Err(LoanAnalyticsError::EmptyDataset(
            "no loan records to segment".into(),
        ));
    }

    #[derive(Default)]
    struct SegmentAcc {
        loan_count: u32,
        disbursed: Decimal,
        recovered: Decimal,
    }

    let mut groups: BTreeMap<String, SegmentAcc> = BTreeMap::new();
    let mut unspecified_count = 0u32;

    for record in records {
        let key = match dimension_value(record, dimension) {
            Some(value) => value.to_string(),
            None => {
                unspecified_count += 1;
                UNSPECIFIED_SEGMENT.to_string()
            }
        };
        let acc = groups.entry(key).or_default();
        acc.loan_count += 1;
        acc.disbursed += record.disbursed_amount;
        acc.recovered += record.recovered_amount;
    }

    let book_disbursed: Decimal = records.iter().map(|r| r.disbursed_amount).sum();

    let mut segments: Vec<SegmentBreakdown> = groups
        .into_iter()
        .map(|(key, acc)| SegmentBreakdown {
            key,
            loan_count: acc.loan_count,
            total_disbursed: acc.disbursed,
            total_recovered: acc.recovered,
            recovery_rate: if acc.disbursed.is_zero() {
                Decimal::ZERO
            } else {
                acc.recovered / acc.disbursed
            },
            share_of_disbursed: if book_disbursed.is_zero() {
                Decimal::ZERO
            } else {
                acc.disbursed / book_disbursed
            },
        })
        .collect();

    // Largest segments first; key breaks ties so output stays stable.
    segments.sort_by(|a, b| {
        b.total_disbursed
            .cmp(&a.total_disbursed)
            .then_with(|| a.key.cmp(&b.key))
    });

    let output = SegmentBreakdownOutput {
        dimension,
        total_records: records.len() as u32,
        unspecified_count,
        segments,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "missing_values": format!("grouped under '{}'", UNSPECIFIED_SEGMENT),
        "order": "descending total_disbursed, then key",
    });

    Ok(with_metadata(
        "Segment breakdown",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn dimension_value(record: &LoanRecord, dimension: SegmentDimension) -> Option<&str> {
    let raw = match dimension {
        SegmentDimension::Gender => record.gender.as_deref(),
        SegmentDimension::AccountType => record.account_type.as_deref(),
        SegmentDimension::CustomerSegment => record.customer_segment.as_deref(),
    };
    raw.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(id: &str, disbursed: Decimal, recovered: Decimal, gender: Option<&str>) -> LoanRecord {
        LoanRecord {
            loan_id: id.to_string(),
            disbursed_amount: disbursed,
            setup_fee: Decimal::ZERO,
            disbursement_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            recovered_amount: recovered,
            outstanding_balance: disbursed - recovered,
            gender: gender.map(|g| g.to_string()),
            account_type: Some("group".to_string()),
            customer_segment: None,
        }
    }

    #[test]
    fn test_counts_sum_to_record_count() {
        let records = vec![
            record("LN-001", dec!(1000), dec!(400), Some("female")),
            record("LN-002", dec!(2000), dec!(500), Some("male")),
            record("LN-003", dec!(500), dec!(0), Some("female")),
            record("LN-004", dec!(750), dec!(250), None),
        ];
        let out = compute_segment_breakdown(&records, SegmentDimension::Gender).unwrap();
        let r = &out.result;

        let total: u32 = r.segments.iter().map(|s| s.loan_count).sum();
        assert_eq!(total, 4);
        assert_eq!(r.total_records, 4);
        assert_eq!(r.unspecified_count, 1);
    }

    #[test]
    fn test_missing_values_bucketed_not_dropped() {
        let records = vec![
            record("LN-001", dec!(1000), dec!(0), Some("female")),
            record("LN-002", dec!(300), dec!(0), None),
            record("LN-003", dec!(200), dec!(0), Some("  ")),
        ];
        let out = compute_segment_breakdown(&records, SegmentDimension::Gender).unwrap();
        let unspecified = out
            .result
            .segments
            .iter()
            .find(|s| s.key == UNSPECIFIED_SEGMENT)
            .expect("unspecified bucket present");

        assert_eq!(unspecified.loan_count, 2);
        assert_eq!(unspecified.total_disbursed, dec!(500));
        assert_eq!(out.result.unspecified_count, 2);
    }

    #[test]
    fn test_segment_aggregates_and_rates() {
        let records = vec![
            record("LN-001", dec!(1000), dec!(400), Some("female")),
            record("LN-002", dec!(1000), dec!(100), Some("female")),
            record("LN-003", dec!(2000), dec!(2000), Some("male")),
        ];
        let out = compute_segment_breakdown(&records, SegmentDimension::Gender).unwrap();
        let female = out
            .result
            .segments
            .iter()
            .find(|s| s.key == "female")
            .unwrap();

        assert_eq!(female.total_disbursed, dec!(2000));
        assert_eq!(female.total_recovered, dec!(500));
        assert_eq!(female.recovery_rate, dec!(0.25));
        assert_eq!(female.share_of_disbursed, dec!(0.5));
    }

    #[test]
    fn test_sorted_by_disbursed_descending() {
        let records = vec![
            record("LN-001", dec!(100), dec!(0), Some("female")),
            record("LN-002", dec!(900), dec!(0), Some("male")),
        ];
        let out = compute_segment_breakdown(&records, SegmentDimension::Gender).unwrap();
        assert_eq!(out.result.segments[0].key, "male");
    }

    #[test]
    fn test_other_dimensions() {
        let records = vec![record("LN-001", dec!(100), dec!(0), Some("female"))];
        let by_account =
            compute_segment_breakdown(&records, SegmentDimension::AccountType).unwrap();
        assert_eq!(by_account.result.segments[0].key, "group");

        let by_segment =
            compute_segment_breakdown(&records, SegmentDimension::CustomerSegment).unwrap();
        assert_eq!(by_segment.result.segments[0].key, UNSPECIFIED_SEGMENT);
    }

    #[test]
    fn test_dimension_parsing() {
        assert_eq!(
            "account-type".parse::<SegmentDimension>().unwrap(),
            SegmentDimension::AccountType
        );
        assert_eq!(
            "customer_segment".parse::<SegmentDimension>().unwrap(),
            SegmentDimension::CustomerSegment
        );
        let err = "branch".parse::<SegmentDimension>().unwrap_err();
        assert!(matches!(err, LoanAnalyticsError::InvalidDimension(d) if d == "branch"));
    }

    #[test]
    fn test_empty_book_rejected() {
        let err = compute_segment_breakdown(&[], SegmentDimension::Gender).unwrap_err();
        assert!(matches!(err, LoanAnalyticsError::EmptyDataset(_)));
    }
}
