mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::portfolio::{ChangeArgs, SummaryArgs, TrendArgs};
use commands::risk::RiskArgs;
use commands::segments::SegmentsArgs;
use commands::validate::ValidateArgs;

/// Loan portfolio analytics for microfinance books
#[derive(Parser)]
#[command(
    name = "lpa",
    version,
    about = "Loan portfolio analytics for microfinance books",
    long_about = "Computes portfolio summaries, disbursement trends, segment \
                  breakdowns and overdue-loan risk profiles from an exported \
                  loan book, with decimal precision. Records come in as CSV, \
                  JSON or YAML files, or piped JSON on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate portfolio summary (totals and recovery rate)
    Summary(SummaryArgs),
    /// Disbursement and recovery trend by calendar bucket
    Trend(TrendArgs),
    /// Period-over-period percentage change
    Change(ChangeArgs),
    /// Break the book down by gender, account type or customer segment
    Segments(SegmentsArgs),
    /// Overdue loans, DPD distribution and portfolio-at-risk
    Risk(RiskArgs),
    /// Parse a raw upload and report data-quality issues
    Validate(ValidateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Summary(args) => commands::portfolio::run_summary(args),
        Commands::Trend(args) => commands::portfolio::run_trend(args),
        Commands::Change(args) => commands::portfolio::run_change(args),
        Commands::Segments(args) => commands::segments::run_segments(args),
        Commands::Risk(args) => commands::risk::run_risk(args),
        Commands::Validate(args) => commands::validate::run_validate(args),
        Commands::Version => {
            println!("lpa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
