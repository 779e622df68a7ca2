use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::record::LoanRecord;
use crate::types::*;
use crate::{LoanAnalyticsError, LoanAnalyticsResult};

/// Standard portfolio-at-risk bands: 1-30, 31-60, 61-90 and over 90 days.
const DPD_BANDS: [(i64, Option<i64>); 4] = [
    (1, Some(30)),
    (31, Some(60)),
    (61, Some(90)),
    (91, None),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One overdue loan with its delinquency depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueLoan {
    pub loan_id: String,
    pub due_date: NaiveDate,
    pub days_past_due: i64,
    pub outstanding_balance: Money,
}

/// Count and exposure inside one days-past-due band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DpdBand {
    pub label: String,
    pub min_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_days: Option<i64>,
    pub loan_count: u32,
    pub outstanding: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskOutput {
    pub as_of: NaiveDate,
    pub overdue_count: u32,
    /// Mean days-past-due across overdue loans; None when none are overdue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_days_past_due: Option<Rate>,
    pub outstanding_at_risk: Money,
    /// Overdue outstanding / total outstanding, 0 when the book carries none
    pub portfolio_at_risk: Rate,
    pub distribution: Vec<DpdBand>,
    pub overdue_loans: Vec<OverdueLoan>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Flag overdue loans as of a given date. Days-past-due is the calendar
/// distance from the due date, floored at zero, so not-yet-due loans never
/// appear in the overdue set.
pub fn compute_risk(
    records: &[LoanRecord],
    as_of: NaiveDate,
) -> LoanAnalyticsResult<ComputationOutput<RiskOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if records.is_empty() {
        return Err(LoanAnalyticsError::EmptyDataset(
            "no loan records to assess".into(),
        ));
    }

    let mut overdue: Vec<OverdueLoan> = Vec::new();
    for record in records {
        let dpd = (as_of - record.due_date).num_days().max(0);
        if dpd > 0 {
            overdue.push(OverdueLoan {
                loan_id: record.loan_id.clone(),
                due_date: record.due_date,
                days_past_due: dpd,
                outstanding_balance: record.outstanding_balance,
            });
        }
    }

    // Deepest delinquency first; loan id breaks ties for stable output.
    overdue.sort_by(|a, b| {
        b.days_past_due
            .cmp(&a.days_past_due)
            .then_with(|| a.loan_id.cmp(&b.loan_id))
    });

    let overdue_count = overdue.len() as u32;
    let outstanding_at_risk: Decimal = overdue.iter().map(|o| o.outstanding_balance).sum();

    let average_days_past_due = if overdue.is_empty() {
        None
    } else {
        let total_dpd: i64 = overdue.iter().map(|o| o.days_past_due).sum();
        Some(Decimal::from(total_dpd) / Decimal::from(overdue.len() as u64))
    };

    let total_outstanding: Decimal = records.iter().map(|r| r.outstanding_balance).sum();
    let portfolio_at_risk = if total_outstanding.is_zero() {
        if overdue_count > 0 {
            warnings.push(
                "Book carries no outstanding balance; portfolio-at-risk reported as 0.".into(),
            );
        }
        Decimal::ZERO
    } else {
        outstanding_at_risk / total_outstanding
    };

    let distribution: Vec<DpdBand> = DPD_BANDS
        .iter()
        .map(|&(min_days, max_days)| {
            let in_band = overdue.iter().filter(|o| {
                o.days_past_due >= min_days
                    && max_days.map_or(true, |max| o.days_past_due <= max)
            });
            let label = match max_days {
                Some(max) => format!("{}-{}", min_days, max),
                None => format!("{}+", min_days - 1),
            };
            DpdBand {
                label,
                min_days,
                max_days,
                loan_count: in_band.clone().count() as u32,
                outstanding: in_band.map(|o| o.outstanding_balance).sum(),
            }
        })
        .collect();

    let output = RiskOutput {
        as_of,
        overdue_count,
        average_days_past_due,
        outstanding_at_risk,
        portfolio_at_risk,
        distribution,
        overdue_loans: overdue,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "days_past_due": "as_of - due_date in days, floored at 0",
        "portfolio_at_risk": "overdue outstanding / total outstanding",
        "bands": "1-30 / 31-60 / 61-90 / 90+",
    });

    Ok(with_metadata(
        "Overdue loan risk profile",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
