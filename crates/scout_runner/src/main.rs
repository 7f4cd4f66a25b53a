//! Opening scout command-line runner.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a single match and print its feature row
//! cargo run -p scout_runner -- analyze --input match.json
//!
//! # Analyze every replay in a directory
//! cargo run -p scout_runner -- batch --input replays/ --output results/ --parallel 8
//!
//! # Markdown report of a batch
//! cargo run -p scout_runner -- summarize --input results/batch.json --output report.md
//! ```
//!
//! Logs go to stderr; feature rows and reports go to stdout unless an
//! output path is given.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_core::analysis::MatchAnalyzer;
use scout_runner::{
    batch::{run_batch, BatchConfig, BatchResults},
    reference_loader::{load_config, load_reference},
    report::{write_json, OutputFormat},
    summary::to_markdown,
};

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Opening strategy and map feature analysis for recorded matches")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single match
    Analyze {
        /// Parsed replay JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reference data directory
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Analysis configuration (RON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Analyze every replay in a directory
    Batch {
        /// Directory of parsed replay JSON files
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Files to write
        #[arg(long, value_enum, default_value_t = OutputFormat::Both)]
        format: OutputFormat,

        /// Reference data directory
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Analysis configuration (RON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip map analysis
        #[arg(long)]
        no_map: bool,
    },

    /// Summarize batch results as markdown
    Summarize {
        /// Batch results JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output markdown report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs on stderr, results on stdout
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            reference,
            config,
        } => cmd_analyze(input, output, reference, config),
        Commands::Batch {
            input,
            output,
            parallel,
            format,
            reference,
            config,
            no_map,
        } => cmd_batch(input, output, parallel, format, reference, config, no_map),
        Commands::Summarize { input, output } => cmd_summarize(input, output),
    }
}

/// Analyze one match
fn cmd_analyze(
    input: PathBuf,
    output: Option<PathBuf>,
    reference: Option<PathBuf>,
    config: Option<PathBuf>,
) {
    let reference = match load_reference(reference.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load reference data: {}", e);
            std::process::exit(1);
        }
    };
    let config = match load_config(config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let analyzer = MatchAnalyzer::new(Arc::new(reference), Arc::new(config));
    let report = match analyzer.analyze_file(&input) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(path = %input.display(), error = %e, "Analysis failed");
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = output {
        if let Err(e) = write_json(&report, &path) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        eprintln!("Report saved to: {}", path.display());
    } else {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to encode report: {}", e);
                std::process::exit(1);
            }
        }
    }

    if !report.warnings.is_empty() {
        eprintln!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            eprintln!("  [{:?}] {}", warning.kind, warning.message);
        }
    }
}

/// Analyze a directory of matches
fn cmd_batch(
    input: PathBuf,
    output: PathBuf,
    parallel: usize,
    format: OutputFormat,
    reference: Option<PathBuf>,
    config: Option<PathBuf>,
    no_map: bool,
) {
    let mut batch = BatchConfig::new(input)
        .with_output(output.clone())
        .with_parallel(parallel)
        .with_format(format);
    if let Some(dir) = reference {
        batch = batch.with_reference_dir(dir);
    }
    if let Some(path) = config {
        batch = batch.with_config(path);
    }
    if no_map {
        batch = batch.without_map_analysis();
    }

    tracing::info!(
        input = %batch.input_dir.display(),
        output = %output.display(),
        parallel = parallel,
        format = ?format,
        map_analysis = batch.include_map_analysis,
        "Batch configuration"
    );

    let results = match run_batch(batch) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "Batch failed");
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    let written = match results.write_outputs() {
        Ok(paths) => paths,
        Err(e) => {
            tracing::error!(error = %e, path = %output.display(), "Failed to save results");
            eprintln!("FATAL: Failed to save results: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches analysed: {}", results.reports.len());
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);

    eprintln!("\nTop openings:");
    for (label, count) in results.summary.strategies_by_frequency().iter().take(5) {
        eprintln!("  {}: {}", label, count);
    }

    if !results.errors.is_empty() {
        eprintln!("\nFAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!("  {}: {}", error.path, error.message);
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    for path in written {
        eprintln!("Saved: {}", path.display());
    }
}

/// Summarize batch results
fn cmd_summarize(input: PathBuf, output: Option<PathBuf>) {
    tracing::info!("Loading batch results from: {}", input.display());

    let results = match BatchResults::load(&input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load results: {}", e);
            std::process::exit(1);
        }
    };

    let report = to_markdown(&results);

    if let Some(out_path) = output {
        if let Err(e) = std::fs::write(&out_path, &report) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        eprintln!("Report saved to: {}", out_path.display());
    } else {
        println!("{}", report);
    }
}
