//! reparto - entity extraction for Spanish narrative
//!
//! Runs the extraction pipeline over documents that were already annotated
//! by an external tagger, and exposes the false-positive filter for quick
//! checks.
//!
//! # Usage
//!
//! ```bash
//! # Extract from a pre-annotated document (JSON, `-` for stdin)
//! reparto extract chapter1.json --project saga --pretty
//!
//! # Ask the filter about a single string
//! reparto check "Hola" --label MISC
//!
//! # Print the default configuration
//! reparto config
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use reparto::{
    EntityLabel, ExtractionOutcome, FalsePositiveFilter, InMemoryFeedbackStore, Phase, Pipeline,
    PipelineConfig, PreAnnotated,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Entity extraction and validation for Spanish narrative fiction
#[derive(Parser)]
#[command(name = "reparto", author, version)]
#[command(propagate_version = true)]
struct Cli {
    /// Log progress and pipeline decisions to stderr (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract entities from a pre-annotated document
    #[command(visible_alias = "x")]
    Extract(ExtractArgs),

    /// Run the false-positive filter on one string
    Check(CheckArgs),

    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Annotated document as JSON (`-` reads stdin)
    input: PathBuf,

    /// Pipeline configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Feedback store (JSON) with overrides and rejections
    #[arg(short, long)]
    feedback: Option<PathBuf>,

    /// Project whose overrides apply
    #[arg(short, long)]
    project: Option<String>,

    /// Skip the validation stage
    #[arg(long)]
    no_validation: bool,

    /// Only print accepted entities
    #[arg(long)]
    entities_only: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Candidate entity text
    text: String,

    /// Label the candidate was tagged with
    #[arg(short, long, default_value = "MISC", value_parser = parse_label)]
    label: EntityLabel,
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Validate this file and print it with defaults filled in
    path: Option<PathBuf>,
}

fn parse_label(s: &str) -> Result<EntityLabel, String> {
    s.parse().map_err(|e: reparto::Error| e.to_string())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Check(args) => run_check(&args),
        Commands::Config(args) => run_config(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings, or more with `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

// ============================================================================
// Commands
// ============================================================================

fn run_extract(args: ExtractArgs) -> Result<(), String> {
    let json = read_input(&args.input)?;
    let engine = PreAnnotated::from_json(&json)
        .map_err(|e| format!("{}: {e}", args.input.display()))?;
    let text = engine.text().to_string();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.no_validation {
        config.enable_validation = false;
    }

    let mut builder = Pipeline::builder(engine).config(config);
    if let Some(path) = &args.feedback {
        let store =
            InMemoryFeedbackStore::load(path).map_err(|e| format!("{}: {e}", path.display()))?;
        builder = builder.feedback(Arc::new(store));
    }
    let pipeline = builder.build().map_err(|e| e.to_string())?;

    let mut report = |phase: Phase, fraction: f64, message: &str| {
        log::info!("[{:>3.0}%] {phase}: {message}", fraction * 100.0);
    };
    let outcome = pipeline.extract_with_progress(&text, args.project.as_deref(), &mut report);
    if let Some(err) = &outcome.error {
        log::warn!("{}", err.user_message);
    }

    print_json(&outcome, args.entities_only, args.pretty)
}

fn run_check(args: &CheckArgs) -> Result<(), String> {
    let filter = FalsePositiveFilter::default();
    match filter.check(&args.text, args.label) {
        Some(reason) => println!("rejected\t{}\t{reason}", args.text),
        None => println!("accepted\t{}", args.text),
    }
    Ok(())
}

fn run_config(args: &ConfigArgs) -> Result<(), String> {
    let config = match &args.path {
        Some(path) => PipelineConfig::load(path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let toml = config.to_toml_string().map_err(|e| e.to_string())?;
    print!("{toml}");
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn read_input(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        return Ok(buf);
    }
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
}

fn print_json(outcome: &ExtractionOutcome, entities_only: bool, pretty: bool) -> Result<(), String> {
    let value = if entities_only {
        serde_json::to_value(&outcome.entities)
    } else {
        serde_json::to_value(outcome)
    }
    .map_err(|e| e.to_string())?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}
