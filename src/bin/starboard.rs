//! Starboard CLI - Command-line interface for the leaderboard pipeline
//!
//! Commands:
//! - rank: Build the ranked leaderboard from raw records
//! - validate: Check raw records against the input contract
//! - schema: Describe the raw record format

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use starboard::format::{render_table, Page};
use starboard::schema::{RawRecord, RawRecordAdapter};
use starboard::{LeaderboardConfig, LeaderboardProcessor, PolicyKind, Row, STARBOARD_VERSION};

/// Starboard - ranked leaderboards for daily two-star puzzles
#[derive(Parser)]
#[command(name = "starboard")]
#[command(version = STARBOARD_VERSION)]
#[command(about = "Build ranked leaderboards from puzzle completion records", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the leaderboard
    Rank {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format (defaults to table on a terminal, ndjson otherwise)
        #[arg(short, long)]
        output: Option<OutputFormat>,

        /// Scoring policy (default: local)
        #[arg(long)]
        policy: Option<PolicyArg>,

        /// Only rank records from this event year
        #[arg(long)]
        year: Option<i32>,

        /// Load settings from a JSON file; flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Zero-based page to show (default 0 when --per-page is set)
        #[arg(long)]
        page: Option<usize>,

        /// Rows per page (10, 25 or 100; default 10 when --page is set)
        #[arg(long)]
        per_page: Option<usize>,
    },

    /// Validate raw records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the raw record schema
    Schema,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Plain-text table
    Table,
    /// Newline-delimited JSON (one row per line)
    Ndjson,
    /// JSON array of rows
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Points per star, ranked within each day
    Local,
    /// One ranking over total time
    TotalTime,
}

impl From<PolicyArg> for PolicyKind {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Local => PolicyKind::Local,
            PolicyArg::TotalTime => PolicyKind::TotalTime,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

fn run(cli: Cli) -> Result<(), StarboardCliError> {
    match cli.command {
        Commands::Rank {
            input,
            input_format,
            output,
            policy,
            year,
            config,
            page,
            per_page,
        } => {
            let mut settings = match config {
                Some(path) => LeaderboardConfig::from_json(&fs::read_to_string(path)?)?,
                None => LeaderboardConfig::default(),
            };
            if let Some(policy) = policy {
                settings.policy = policy.into();
            }
            if year.is_some() {
                settings.year = year;
            }

            let page = Page::requested(page, per_page)?;
            let output = output.unwrap_or_else(|| {
                if atty::is(atty::Stream::Stdout) {
                    OutputFormat::Table
                } else {
                    OutputFormat::Ndjson
                }
            });

            cmd_rank(&input, input_format, output, settings, page)
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema => cmd_schema(),
    }
}

fn read_records(input: &Path, input_format: &InputFormat) -> Result<Vec<RawRecord>, StarboardCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match input_format {
        InputFormat::Ndjson => RawRecordAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => RawRecordAdapter::parse_array(&input_data)?,
    };

    if records.is_empty() {
        return Err(StarboardCliError::NoRecords);
    }

    Ok(records)
}

fn cmd_rank(
    input: &Path,
    input_format: InputFormat,
    output: OutputFormat,
    config: LeaderboardConfig,
    page: Option<Page>,
) -> Result<(), StarboardCliError> {
    let records = read_records(input, &input_format)?;

    let processor = LeaderboardProcessor::new(config);
    let rows = processor.process(&records)?;

    let (shown, first_rank) = match page {
        Some(page) => {
            log::debug!(
                "Showing page {} of {}",
                page.index + 1,
                page.count(rows.len()).max(1)
            );
            (page.slice(&rows), page.offset() + 1)
        }
        None => (rows.as_slice(), 1),
    };

    print!("{}", format_output(shown, first_rank, &output)?);
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), StarboardCliError> {
    let records = read_records(input, &input_format)?;
    let results = RawRecordAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        scoreable_records: records.iter().filter(|r| r.is_scoreable()).count(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                username: r.username.clone(),
                day: r.day,
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:     {}", report.total_records);
        println!("Valid records:     {}", report.valid_records);
        println!("Invalid records:   {}", report.invalid_records);
        println!("Scoreable records: {}", report.scoreable_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - {} day {} (index {}): {}",
                    err.username, err.day, err.index, err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(StarboardCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema() -> Result<(), StarboardCliError> {
    println!("Raw record schema");
    println!();
    println!("One JSON object per user per puzzle day:");
    println!();
    println!("- day:       integer, 1-25");
    println!("- year:      integer, event year");
    println!("- username:  string, non-empty");
    println!("- startTime: timestamp, optional");
    println!("- starOne:   timestamp, optional");
    println!("- starTwo:   timestamp, optional (requires starOne)");
    println!();
    println!("Timestamps are RFC 3339 strings or epoch milliseconds.");
    println!("Records without startTime or starOne are ignored when ranking.");
    Ok(())
}

// Helper functions

fn format_output(rows: &[Row], first_rank: usize, format: &OutputFormat) -> Result<String, StarboardCliError> {
    match format {
        OutputFormat::Table => Ok(render_table(rows, first_rank)),
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for row in rows {
                lines.push(serde_json::to_string(row)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(rows)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(rows)? + "\n"),
    }
}

// Error handling

#[derive(Debug)]
enum StarboardCliError {
    Io(io::Error),
    Compute(starboard::ComputeError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
}

impl From<io::Error> for StarboardCliError {
    fn from(e: io::Error) -> Self {
        StarboardCliError::Io(e)
    }
}

impl From<starboard::ComputeError> for StarboardCliError {
    fn from(e: starboard::ComputeError) -> Self {
        StarboardCliError::Compute(e)
    }
}

impl From<serde_json::Error> for StarboardCliError {
    fn from(e: serde_json::Error) -> Self {
        StarboardCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StarboardCliError> for CliError {
    fn from(e: StarboardCliError) -> Self {
        match e {
            StarboardCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StarboardCliError::Compute(starboard::ComputeError::InvalidPage(msg)) => CliError {
                code: "INVALID_PAGE".to_string(),
                message: msg,
                hint: Some("Use --per-page 10, 25 or 100".to_string()),
            },
            StarboardCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'starboard validate' for details".to_string()),
            },
            StarboardCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            StarboardCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            StarboardCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    scoreable_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    username: String,
    day: u32,
    error: String,
}
