//! callscope CLI tool
//!
//! Reconstructs call sessions from a JSON or JSON Lines record dump and
//! prints them (or an outcome summary) as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use callscope_common::{
    init_logging, init_logging_with_filter, load_records, CallscopeConfig, LogLevel, OptionOverrides,
};
use callscope_session::{SessionBuilder, SessionSummary};

const DEFAULT_LOG_FILTER: &str = "warn";

/// callscope - drive-test call session reconstruction
#[derive(Parser, Debug)]
#[command(name = "callscope")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Normalized records, JSON array or JSON Lines
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum gap inside one session, in milliseconds
    #[arg(long = "time-window-ms", value_name = "MS")]
    pub time_window_ms: Option<f64>,

    /// Maximum delay from RRC Connection Request to NAS call control
    #[arg(long = "rrc-nas-follow-ms", value_name = "MS")]
    pub rrc_nas_follow_ms: Option<f64>,

    /// Unconnected attempts shorter than this are ignored
    #[arg(long = "min-valid-attempt-ms", value_name = "MS")]
    pub min_valid_attempt_ms: Option<f64>,

    /// Unconnected attempts longer than this are incomplete
    #[arg(long = "max-setup-window-ms", value_name = "MS")]
    pub max_setup_window_ms: Option<f64>,

    /// Print outcome counts instead of the sessions
    #[arg(short = 's', long = "summary")]
    pub summary: bool,

    /// Log level or filter, overrides the configuration file
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Threshold overrides given on the command line.
    fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            time_window_ms: self.time_window_ms,
            rrc_nas_follow_ms: self.rrc_nas_follow_ms,
            min_valid_attempt_ms: self.min_valid_attempt_ms,
            max_setup_window_ms: self.max_setup_window_ms,
        }
    }

    /// Log setting: command line, then configuration file, then the default.
    fn log_filter<'a>(&'a self, config: &'a CallscopeConfig) -> &'a str {
        self.log_level
            .as_deref()
            .or(config.log_level.as_deref())
            .unwrap_or(DEFAULT_LOG_FILTER)
    }
}

/// A plain level goes through [`init_logging`]; anything else is taken as a
/// filter directive such as `info,callscope_session=trace`.
fn setup_logging(filter: &str) {
    match filter.parse::<LogLevel>() {
        Ok(level) => init_logging(level),
        Err(_) => init_logging_with_filter(filter),
    }
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => CallscopeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CallscopeConfig::default(),
    };
    config.session = config.session.merged_with(&args.overrides());

    setup_logging(args.log_filter(&config));

    let options = config.session_options().context("Invalid session options")?;
    tracing::info!(?options, "session options");

    let records = load_records(&args.input)
        .with_context(|| format!("Failed to read records from {}", args.input.display()))?;
    tracing::info!(records = records.len(), input = %args.input.display(), "records loaded");

    let sessions = SessionBuilder::new(options).build(&records);
    let summary = SessionSummary::from_sessions(&sessions);
    tracing::info!(
        sessions = summary.total,
        drops = summary.drops,
        setup_failures = summary.setup_failures,
        success_rate = ?summary.success_rate,
        "sessions built"
    );

    let output = if args.summary {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string_pretty(&sessions)?
    };
    println!("{}", output);
    Ok(())
}
