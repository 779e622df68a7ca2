use clap::{Args, ValueEnum};
use serde_json::Value;

use loan_analytics_core::analytics::summary::compute_summary;
use loan_analytics_core::analytics::trend::{compute_period_change, compute_trend, TimeBucket};

use crate::input::records::{load_records, SourceArgs};

/// Calendar bucket flag shared by trend and change.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BucketArg {
    Day,
    Month,
    Year,
}

impl From<BucketArg> for TimeBucket {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Day => TimeBucket::Day,
            BucketArg::Month => TimeBucket::Month,
            BucketArg::Year => TimeBucket::Year,
        }
    }
}

/// Arguments for the aggregate summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the trend series
#[derive(Args)]
pub struct TrendArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Calendar bucket
    #[arg(long, value_enum, default_value = "month")]
    pub bucket: BucketArg,

    /// Emit interior empty periods with zero amounts
    #[arg(long)]
    pub zero_fill: bool,
}

/// Arguments for period-over-period change
#[derive(Args)]
pub struct ChangeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Calendar bucket
    #[arg(long, value_enum, default_value = "month")]
    pub bucket: BucketArg,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = load_records(&args.source)?;
    let output = compute_summary(&records)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_trend(args: TrendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = load_records(&args.source)?;
    let output = compute_trend(&records, args.bucket.into(), args.zero_fill)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_change(args: ChangeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = load_records(&args.source)?;
    let output = compute_period_change(&records, args.bucket.into())?;
    Ok(serde_json::to_value(output)?)
}
