use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use listing_extract::source::is_url;
use listing_extract::{
    expected_fields, render_panels, AppConfig, DocumentSource, ExtractionReport, ExtractionSchema,
    FileSource, HttpSource, SchemaExtractor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Compact JSON array of records
    Json,
    /// Indented JSON array of records
    Pretty,
    /// Full report (success flag, source, records) as JSON
    Report,
    /// One text panel per record
    Panels,
}

/// Extract structured records from a listing page with a selector schema.
#[derive(Debug, Parser)]
#[command(name = "listing-extract", version)]
struct Cli {
    /// Schema JSON file (name, baseSelector, fields)
    #[arg(short, long)]
    schema: PathBuf,

    /// http(s) URL, file path, or `-` for stdin
    source: String,

    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Field reported as missing when empty; repeatable. Defaults to the
    /// configured list, then to every schema field.
    #[arg(short, long = "require")]
    required: Vec<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("listing-extract error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let schema = ExtractionSchema::from_path(&cli.schema)
        .with_context(|| format!("invalid schema {}", cli.schema.display()))?;

    let required = if cli.required.is_empty() {
        &config.display.required_fields
    } else {
        &cli.required
    };
    let expected = expected_fields(&schema, required);

    let fetched = if is_url(&cli.source) {
        HttpSource::new(&config.fetch).fetch(&cli.source)
    } else {
        FileSource.fetch(&cli.source)
    };

    let bytes = match fetched {
        Ok(bytes) => bytes,
        Err(err) => {
            if cli.format == OutputFormat::Report || cli.format == OutputFormat::Panels {
                let report = ExtractionReport::failed(&cli.source, &schema, &err);
                print_report(&report, cli.format, &expected)?;
            }
            return Err(err).context("failed to fetch document");
        }
    };

    let extractor = SchemaExtractor::new(config.extract);
    let records = extractor
        .extract_bytes(&bytes, &schema)
        .context("failed to decode document")?;
    info!(records = records.len(), source = %cli.source, "extraction finished");

    let report = ExtractionReport::succeeded(&cli.source, &schema, records);
    for incomplete in report.incomplete(&expected) {
        warn!(
            record = incomplete.index + 1,
            missing = %incomplete.missing.join(", "),
            "record is missing fields"
        );
    }

    print_report(&report, cli.format, &expected)
}

fn print_report(
    report: &ExtractionReport,
    format: OutputFormat,
    expected: &[String],
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", report.records.to_json()?),
        OutputFormat::Pretty => println!("{}", report.records.to_json_pretty()?),
        OutputFormat::Report => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Panels => print!("{}", render_panels(report, expected)),
    }
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("LISTING_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
