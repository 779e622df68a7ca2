use chrono::{Local, NaiveDate};
use clap::Args;
use serde_json::Value;

use loan_analytics_core::analytics::risk::compute_risk;

use crate::input::records::{load_records, SourceArgs};

/// Arguments for the risk profile
#[derive(Args)]
pub struct RiskArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Reference date for days-past-due (YYYY-MM-DD); today when omitted
    #[arg(long)]
    pub as_of: Option<String>,
}

pub fn run_risk(args: RiskArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let as_of = match &args.as_of {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| format!("--as-of '{}' is not a YYYY-MM-DD date", text))?,
        None => Local::now().date_naive(),
    };
    let records = load_records(&args.source)?;
    let output = compute_risk(&records, as_of)?;
    Ok(serde_json::to_value(output)?)
}
