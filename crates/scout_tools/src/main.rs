//! Opening scout development tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_core::data::ReferenceData;
use scout_tools::export::{export_builtin, ExportStyle};
use scout_tools::lookup::lookup_duration;
use scout_tools::validate::{validate_reference_dir, FileStatus};

#[derive(Parser)]
#[command(name = "scout-tools")]
#[command(about = "Reference data tools for opening scout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a reference data directory
    Validate {
        /// Path to reference directory
        #[arg(default_value = "crates/scout_core/data")]
        path: PathBuf,
    },
    /// Write the built-in reference tables as RON
    Export {
        /// Output directory
        path: PathBuf,

        /// Keep the shipped text or re-serialize
        #[arg(long, value_enum, default_value_t = ExportStyle::Annotated)]
        style: ExportStyle,
    },
    /// Print one resolved duration
    Lookup {
        /// Table: buildings, technologies or units
        table: String,

        /// Entity name
        entity: String,

        /// Civilization
        #[arg(long)]
        civ: Option<String>,

        /// Age the entity is produced in
        #[arg(long)]
        age: Option<String>,

        /// Reference directory instead of the built-in tables
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Print as RON
        #[arg(long = "ron")]
        as_ron: bool,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating reference data in: {}", path.display());
            let report = match validate_reference_dir(&path) {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            };
            for file in &report.files {
                match &file.status {
                    FileStatus::Valid { entries } => println!("ok      {} ({entries} entries)", file.file_name),
                    FileStatus::Missing => println!("builtin {}", file.file_name),
                    FileStatus::Invalid(message) => println!("FAILED  {}: {message}", file.file_name),
                }
            }
            if let Some(problem) = &report.cross_check {
                println!("FAILED  combined: {problem}");
            }
            if let Err(e) = report.into_result() {
                tracing::error!("Validation failed: {e}");
                std::process::exit(1);
            }
            tracing::info!("Validation passed");
        }
        Commands::Export { path, style } => match export_builtin(&path, style) {
            Ok(written) => {
                for file in written {
                    println!("{}", file.display());
                }
            }
            Err(e) => {
                tracing::error!("Export failed: {e}");
                std::process::exit(1);
            }
        },
        Commands::Lookup {
            table,
            entity,
            civ,
            age,
            reference,
            as_ron,
        } => {
            let data = match &reference {
                Some(dir) => ReferenceData::load_from_dir(dir),
                None => ReferenceData::builtin(),
            };
            let result = data
                .map_err(scout_tools::ToolError::from)
                .and_then(|data| lookup_duration(&data, &table, &entity, civ.as_deref(), age.as_deref()));
            match result {
                Ok(result) if as_ron => match ron::ser::to_string_pretty(&result, ron::ser::PrettyConfig::new()) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        tracing::error!("Failed to encode result: {e}");
                        std::process::exit(1);
                    }
                },
                Ok(result) => println!("{result}"),
                Err(e) => {
                    tracing::error!("Lookup failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
