//! Tracklift: video annotation exports to per-track labels.
//!
//! Tracklift reads a video-annotation export (one polygon per track per
//! frame, plus optional per-track answers), turns every polygon into a
//! fractional bounding box, regroups the scattered records into tracks, and
//! replays those tracks against a label store.
//!
//! # Modules
//!
//! - [`ir`]: Export model, reader and polygon normalizer
//! - [`assemble`]: Folding records into tracks, with an assembly report
//! - [`upload`]: The [`upload::LabelStore`] trait, stores, and the emitter
//! - [`error`]: Error types for tracklift operations

pub mod assemble;
pub mod error;
pub mod ir;
pub mod upload;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::TrackliftError;

/// The tracklift CLI application.
#[derive(Parser)]
#[command(name = "tracklift")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Assemble an export into tracks and report what was found.
    Inspect(InspectArgs),
    /// Assemble an export and upload its tracks to a project.
    Upload(UploadArgs),
}

/// Options shared by every subcommand that assembles an export.
#[derive(clap::Args)]
struct AssembleArgs {
    /// Export JSON file.
    input: PathBuf,

    /// Skip records whose file has no video_meta entry instead of failing.
    #[arg(long)]
    skip_missing_media: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    #[command(flatten)]
    assemble: AssembleArgs,
}

/// Arguments for the upload subcommand.
#[derive(clap::Args)]
struct UploadArgs {
    #[command(flatten)]
    assemble: AssembleArgs,

    /// Project file (YAML) listing label rows and the ontology.
    #[arg(long, env = "TRACKLIFT_PROJECT")]
    project: PathBuf,

    /// Directory the committed labels files are written to.
    #[arg(long, default_value = "labels")]
    out: PathBuf,

    /// Ontology class every track is created as.
    #[arg(long, env = "TRACKLIFT_CLASS", default_value = "Person")]
    class: String,

    /// Question to upload answers for (repeatable; default: all questions).
    #[arg(long = "attribute", value_name = "QUESTION")]
    attributes: Vec<String>,

    /// Fail when a file has no matching label row instead of skipping it.
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self, TrackliftError> {
        match value {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(TrackliftError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            ))),
        }
    }
}

/// Run the tracklift CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), TrackliftError> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Upload(args)) => run_upload(args),
        None => {
            println!("tracklift {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Assemble video annotation exports into per-track labels.");
            println!();
            println!("Run 'tracklift --help' for usage information.");
            Ok(())
        }
    }
}

/// Logs go to stderr so that reports on stdout stay machine-readable.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracklift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_and_assemble(
    args: &AssembleArgs,
) -> Result<(OutputFormat, assemble::Assembly), TrackliftError> {
    let output = OutputFormat::parse(&args.output)?;

    let export = ir::io_export_json::read_export_json(&args.input)?;
    tracing::info!(
        path = %args.input.display(),
        media = export.dimensions.len(),
        records = export.records.len(),
        metadata = export.metadata_len(),
        "read export"
    );

    let opts = assemble::AssembleOptions {
        skip_missing_media: args.skip_missing_media,
    };
    let assembly = assemble::assemble_export(&export, &opts)?;
    Ok((output, assembly))
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), TrackliftError> {
    let (output, assembly) = load_and_assemble(&args.assemble)?;

    match output {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct InspectOutput<'a> {
                report: &'a assemble::AssemblyReport,
                tracks: &'a ir::AssembledExport,
            }
            write_json(&InspectOutput {
                report: &assembly.report,
                tracks: &assembly.export,
            })
        }
        OutputFormat::Text => {
            println!("Assembled {}:", args.assemble.input.display());
            print!("{}", assembly.report);
            Ok(())
        }
    }
}

/// Execute the upload subcommand.
fn run_upload(args: UploadArgs) -> Result<(), TrackliftError> {
    let (output, assembly) = load_and_assemble(&args.assemble)?;

    let mut store = upload::LocalStore::open(&args.project, &args.out)?;
    let opts = upload::UploadOptions {
        class_name: args.class,
        attributes: args.attributes,
        strict: args.strict,
    };
    let report = upload::upload(&assembly.export, &mut store, &opts)?;

    match output {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct UploadOutput<'a> {
                assembly: &'a assemble::AssemblyReport,
                upload: &'a upload::UploadReport,
            }
            write_json(&UploadOutput {
                assembly: &assembly.report,
                upload: &report,
            })
        }
        OutputFormat::Text => {
            println!("Assembled {}:", args.assemble.input.display());
            print!("{}", assembly.report);
            println!();
            println!(
                "Uploaded {} file(s) to {}:",
                report.uploaded.len(),
                args.out.display()
            );
            print!("{}", report);
            Ok(())
        }
    }
}

fn write_json<T: Serialize>(value: &T) -> Result<(), TrackliftError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(std::io::Error::from)?;
    writeln!(stdout)?;
    Ok(())
}
