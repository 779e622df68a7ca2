use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use loan_analytics_core::analytics::risk::compute_risk;
use loan_analytics_core::analytics::segment::{compute_segment_breakdown, SegmentDimension};
use loan_analytics_core::analytics::summary::compute_summary;
use loan_analytics_core::analytics::trend::{compute_period_change, compute_trend, TimeBucket};
use loan_analytics_core::record::audit::{audit_records, DEFAULT_BALANCE_TOLERANCE};
use loan_analytics_core::record::parse::{parse_records, RawLoanRecord, SchemaConfig};
use loan_analytics_core::record::LoanRecord;
use rust_decimal::Decimal;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn portfolio_summary(records_json: String) -> NapiResult<String> {
    let records: Vec<LoanRecord> = serde_json::from_str(&records_json).map_err(to_napi_error)?;
    let output = compute_summary(&records).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct TrendRequest {
    records: Vec<LoanRecord>,
    bucket: TimeBucket,
    #[serde(default)]
    zero_fill: bool,
}

#[napi]
pub fn disbursement_trend(input_json: String) -> NapiResult<String> {
    let input: TrendRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        compute_trend(&input.records, input.bucket, input.zero_fill).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ChangeRequest {
    records: Vec<LoanRecord>,
    bucket: TimeBucket,
}

#[napi]
pub fn period_change(input_json: String) -> NapiResult<String> {
    let input: ChangeRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = compute_period_change(&input.records, input.bucket).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SegmentRequest {
    records: Vec<LoanRecord>,
    dimension: String,
}

#[napi]
pub fn segment_breakdown(input_json: String) -> NapiResult<String> {
    let input: SegmentRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let dimension: SegmentDimension = input.dimension.parse().map_err(to_napi_error)?;
    let output = compute_segment_breakdown(&input.records, dimension).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RiskRequest {
    records: Vec<LoanRecord>,
    /// Reference date; absent means today
    as_of: Option<NaiveDate>,
}

#[napi]
pub fn risk_profile(input_json: String) -> NapiResult<String> {
    let input: RiskRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let as_of = input
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let output = compute_risk(&input.records, as_of).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Upload validation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct UploadRequest {
    rows: Vec<RawLoanRecord>,
    #[serde(default)]
    schema: Option<SchemaConfig>,
    #[serde(default)]
    tolerance: Option<Decimal>,
}

#[napi]
pub fn parse_and_audit(input_json: String) -> NapiResult<String> {
    let input: UploadRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let schema = input.schema.unwrap_or_default();
    let outcome = parse_records(&input.rows, &schema);

    let audit = if outcome.records.is_empty() {
        serde_json::Value::Null
    } else {
        let tolerance = input.tolerance.unwrap_or(DEFAULT_BALANCE_TOLERANCE);
        let audited = audit_records(&outcome.records, tolerance).map_err(to_napi_error)?;
        serde_json::to_value(audited).map_err(to_napi_error)?
    };

    let combined = serde_json::json!({
        "outcome": outcome,
        "audit": audit,
    });
    serde_json::to_string(&combined).map_err(to_napi_error)
}
