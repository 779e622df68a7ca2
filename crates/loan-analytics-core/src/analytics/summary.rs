use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::record::LoanRecord;
use crate::types::*;
use crate::{LoanAnalyticsError, LoanAnalyticsResult};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Read-only aggregate snapshot of the whole book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub loan_count: u32,
    pub total_disbursed: Money,
    pub total_setup_fees: Money,
    pub total_recovered: Money,
    pub total_outstanding: Money,
    /// total_recovered / total_disbursed; 0 when nothing was disbursed
    pub recovery_rate: Rate,
    pub average_loan_size: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sum disbursed, fees, recovered and outstanding across the full record
/// set and derive the portfolio recovery rate.
pub fn compute_summary(
    records: &[LoanRecord],
) -> LoanAnalyticsResult<ComputationOutput<AggregateSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if records.is_empty() {
        return Err(LoanAnalyticsError::EmptyDataset(
            "no loan records to summarise".into(),
        ));
    }

    let total_disbursed: Decimal = records.iter().map(|r| r.disbursed_amount).sum();
    let total_setup_fees: Decimal = records.iter().map(|r| r.setup_fee).sum();
    let total_recovered: Decimal = records.iter().map(|r| r.recovered_amount).sum();
    let total_outstanding: Decimal = records.iter().map(|r| r.outstanding_balance).sum();

    let recovery_rate = if total_disbursed.is_zero() {
        Decimal::ZERO
    } else {
        total_recovered / total_disbursed
    };

    if total_recovered > total_disbursed {
        warnings.push("Total recovered exceeds total disbursed; recovery rate is above 1.".into());
    }
    if records.iter().any(|r| r.disbursed_amount < Decimal::ZERO) {
        warnings.push("Negative disbursed amounts present in the book.".into());
    }

    let average_loan_size = total_disbursed / Decimal::from(records.len() as u64);

    let output = AggregateSummary {
        loan_count: records.len() as u32,
        total_disbursed,
        total_setup_fees,
        total_recovered,
        total_outstanding,
        recovery_rate,
        average_loan_size,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "recovery_rate": "total_recovered / total_disbursed, 0 when nothing disbursed",
        "average_loan_size": "total_disbursed / loan_count",
    });

    Ok(with_metadata(
        "Portfolio aggregate summary",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
