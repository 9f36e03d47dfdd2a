//! SAMM Bridge CLI
//!
//! Command-line tool for importing SAMM Turtle documents, exporting them
//! again and deriving submodel templates.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::Level;

use samm_bridge::{
    export_document, import_file, transform_to_submodel, ExportOptions, IdSet, ImportOptions,
    ImportedDocument, LookupStore, SammError, SammVersion, TransformOptions,
};

#[derive(Parser)]
#[command(name = "samm-bridge")]
#[command(about = "Import, export and transform SAMM aspect models")]
#[command(version)]
struct Cli {
    /// Log level written to stderr
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a Turtle document and print its records as JSON
    Import(ImportArgs),
    /// Import a Turtle document and export its Aspect again
    Roundtrip(RoundtripArgs),
    /// Derive a submodel template from a document's Aspect
    Transform(TransformArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Version {
    #[value(name = "bamm-1.0.0")]
    Bamm100,
    #[value(name = "2.0.0")]
    Samm200,
    #[value(name = "2.1.0")]
    Samm210,
    #[value(name = "2.2.0")]
    Samm220,
    #[value(name = "2.3.0")]
    Samm230,
}

impl From<Version> for SammVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::Bamm100 => SammVersion::Bamm1_0_0,
            Version::Samm200 => SammVersion::Samm2_0_0,
            Version::Samm210 => SammVersion::Samm2_1_0,
            Version::Samm220 => SammVersion::Samm2_2_0,
            Version::Samm230 => SammVersion::Samm2_3_0,
        }
    }
}

#[derive(Args)]
struct SourceArgs {
    /// Path to the Turtle (.ttl) document
    source: PathBuf,

    /// Meta model release to assume instead of detecting it
    #[arg(long, value_enum)]
    samm_version: Option<Version>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ImportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct RoundtripArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Don't re-emit the document's header comments
    #[arg(long)]
    no_comments: bool,

    /// Maximum reference depth followed during export
    #[arg(long, default_value_t = 64)]
    max_depth: usize,
}

#[derive(Args)]
struct TransformArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Maximum Entity nesting
    #[arg(long, default_value_t = 32)]
    max_depth: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    version: String,
    aspect: Option<String>,
    comments: Vec<String>,
    records: Vec<RecordSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordSummary {
    id: String,
    id_short: String,
    kind: String,
    fields: serde_json::Value,
}

impl ImportSummary {
    fn from_document(document: &ImportedDocument) -> Result<Self, SammError> {
        let records = document
            .records
            .iter()
            .map(|r| {
                Ok(RecordSummary {
                    id: r.id.clone(),
                    id_short: r.id_short.clone(),
                    kind: r.kind().to_string(),
                    fields: r.element.to_payload()?,
                })
            })
            .collect::<Result<Vec<_>, SammError>>()?;
        Ok(Self {
            version: document.id_set.version.to_string(),
            aspect: document.aspect_id.clone(),
            comments: document.comments.clone(),
            records,
        })
    }
}

fn load_document(args: &SourceArgs) -> Result<ImportedDocument, SammError> {
    let options = ImportOptions {
        id_set: args.samm_version.map(|v| IdSet::for_version(v.into())),
        ..ImportOptions::default()
    };
    let document = import_file(&args.source, &options)?;
    eprintln!(
        "Imported {} records from {} ({})",
        document.records.len(),
        args.source.display(),
        document.id_set.version
    );
    Ok(document)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, SammError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Write output to file or stdout
fn write_output(content: &str, output: Option<&PathBuf>) -> Result<(), SammError> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("Wrote output to {}", path.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

fn run_import(args: ImportArgs) -> Result<(), SammError> {
    let document = load_document(&args.source)?;
    let summary = ImportSummary::from_document(&document)?;
    let output = to_json(&summary, args.pretty)?;
    write_output(&output, args.source.output.as_ref())
}

fn run_roundtrip(args: RoundtripArgs) -> Result<(), SammError> {
    let document = load_document(&args.source)?;
    let aspect_id = document.aspect_id.clone().ok_or(SammError::MissingAspect)?;

    let options = ExportOptions {
        max_depth: args.max_depth,
        emit_comments: !args.no_comments,
    };
    let turtle = export_document(&document.environment, &aspect_id, &options)?;
    write_output(&turtle, args.source.output.as_ref())
}

fn run_transform(args: TransformArgs) -> Result<(), SammError> {
    let document = load_document(&args.source)?;
    let aspect_id = document.aspect_id.clone().ok_or(SammError::MissingAspect)?;

    let store = LookupStore::build(&document.environment);
    let options = TransformOptions {
        max_depth: args.max_depth,
    };
    let template = transform_to_submodel(&store, &aspect_id, &options)?;

    eprintln!(
        "Derived {} top-level submodel elements for {}",
        template.elements.len(),
        template.id_short
    );

    let output = to_json(&template, args.pretty)?;
    write_output(&output, args.source.output.as_ref())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Import(args) => run_import(args),
        Commands::Roundtrip(args) => run_roundtrip(args),
        Commands::Transform(args) => run_transform(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
