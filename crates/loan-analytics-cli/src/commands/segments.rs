use clap::Args;
use serde_json::Value;

use loan_analytics_core::analytics::segment::{compute_segment_breakdown, SegmentDimension};

use crate::input::records::{load_records, SourceArgs};

/// Arguments for the segment breakdown
#[derive(Args)]
pub struct SegmentsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Grouping dimension: gender, account-type or customer-segment
    #[arg(long, default_value = "customer-segment")]
    pub dimension: String,
}

pub fn run_segments(args: SegmentsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dimension: SegmentDimension = args.dimension.parse()?;
    let records = load_records(&args.source)?;
    let output = compute_segment_breakdown(&records, dimension)?;
    Ok(serde_json::to_value(output)?)
}
