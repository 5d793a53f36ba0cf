//! Convert command - Generate IaC artifacts from an infrastructure document.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use tracing::{debug, info};

use infra_codegen::request::supports;
use infra_codegen::{
    ConversionRequest, EmitOptions, GenerationReport, IacFormat, MappingTables, Orchestrator,
};
use infra_graph::{BuilderOptions, CloudProvider, DocumentReader};

use crate::config::CliConfig;

const DEFAULT_OUT_DIR: &str = "infragen-out";

#[derive(Args)]
pub struct ConvertArgs {
    /// Input document: JSON, YAML, or an analysis reply containing JSON
    #[arg(short, long)]
    input: PathBuf,

    /// Cloud provider (aws, azure, gcp); defaults to the document's provider
    #[arg(short, long)]
    provider: Option<CloudProvider>,

    /// Output format, repeatable (terraform, cloudformation, pulumi-python, pulumi-typescript)
    #[arg(short, long = "format", value_name = "FORMAT")]
    formats: Vec<IacFormat>,

    /// Directory for generated files
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Print artifacts to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Run emitters in parallel
    #[arg(long)]
    parallel: bool,

    /// Extra mapping files merged over the built-in tables
    #[arg(long = "mappings", value_name = "FILE")]
    mappings: Vec<PathBuf>,

    /// Region written into provider configuration
    #[arg(long)]
    region: Option<String>,

    /// Do not expand the document's network block into resources
    #[arg(long)]
    no_network: bool,

    /// Omit generated-by header comments
    #[arg(long)]
    no_header: bool,

    /// Configuration file (defaults to ./infragen.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub async fn execute(args: ConvertArgs) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let config = CliConfig::discover(args.config.as_deref(), &current_dir)?;

    info!("Converting {}", args.input.display());
    let document = DocumentReader::read_file(&args.input)
        .with_context(|| format!("Failed to read input document {}", args.input.display()))?;

    let provider = resolve_provider(args.provider, &config, &document)?;
    let formats = resolve_formats(&args.formats, &config, provider);
    debug!(
        "Provider {}, formats {:?}",
        provider,
        formats.iter().map(IacFormat::as_str).collect::<Vec<_>>()
    );

    let mut tables = MappingTables::builtin().context("Failed to load built-in mappings")?;
    for path in config.mappings.iter().chain(&args.mappings) {
        tables
            .merge_file(path)
            .with_context(|| format!("Failed to merge mapping file {}", path.display()))?;
    }

    let mut emit_options = EmitOptions::default()
        .with_header(!args.no_header && config.header.unwrap_or(true));
    if let Some(region) = args.region.as_ref().or(config.region.as_ref()) {
        emit_options = emit_options.with_region(region.clone());
    }
    let builder_options = BuilderOptions {
        lower_network: !args.no_network && config.lower_network.unwrap_or(true),
    };

    let orchestrator = Orchestrator::with_emit_options(tables, emit_options)
        .with_builder_options(builder_options);
    let request = ConversionRequest::new(provider, formats);

    let report = if args.parallel || config.parallel {
        orchestrator.convert_concurrent(&document, &request).await?
    } else {
        orchestrator.convert(&document, &request)?
    };

    for warning in &report.warnings {
        eprintln!("⚠️  {}", warning);
    }

    if report.artifacts.is_empty() {
        anyhow::bail!("IaC generation failed: no artifacts were produced");
    }

    if args.stdout {
        print_artifacts(&report);
    } else {
        let out_dir = args
            .out_dir
            .or(config.out_dir)
            .unwrap_or_else(|| current_dir.join(DEFAULT_OUT_DIR));
        for (path, count) in write_artifacts(&report, &out_dir)? {
            println!("✅ Wrote {} ({} resources)", path.display(), count);
        }
    }

    Ok(())
}

/// `--provider`, then the config file, then the document's own tag.
fn resolve_provider(
    flag: Option<CloudProvider>,
    config: &CliConfig,
    document: &Value,
) -> Result<CloudProvider> {
    if let Some(provider) = flag.or(config.provider) {
        return Ok(provider);
    }
    match document.get("provider").and_then(Value::as_str) {
        Some(tag) => tag
            .parse::<CloudProvider>()
            .with_context(|| format!("Invalid argument: unrecognized provider '{tag}'")),
        None => anyhow::bail!(
            "Missing argument: pass --provider or set a provider in the document"
        ),
    }
}

/// `--format` flags, then the config file, then every format the provider supports.
fn resolve_formats(flags: &[IacFormat], config: &CliConfig, provider: CloudProvider) -> Vec<IacFormat> {
    if !flags.is_empty() {
        return flags.to_vec();
    }
    if !config.formats.is_empty() {
        return config.formats.clone();
    }
    IacFormat::all()
        .into_iter()
        .filter(|f| supports(*f, provider))
        .collect()
}

fn print_artifacts(report: &GenerationReport) {
    let multiple = report.artifacts.len() > 1;
    for artifact in &report.artifacts {
        if multiple {
            println!("==> {} <==", artifact.filename);
        }
        print!("{}", artifact.code);
        if multiple {
            println!();
        }
    }
}

/// Write each artifact to `dir/<filename>`, returning paths and resource counts.
fn write_artifacts(report: &GenerationReport, dir: &Path) -> Result<Vec<(PathBuf, usize)>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(report.artifacts.len());
    for artifact in &report.artifacts {
        let path = dir.join(&artifact.filename);
        fs::write(&path, &artifact.code)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push((path, artifact.resource_names.len()));
    }
    Ok(written)
}
