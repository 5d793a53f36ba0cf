//! Mappings command - List mapped resource types per provider.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use infra_codegen::mapping::ResourceSpec;
use infra_codegen::MappingTables;
use infra_graph::CloudProvider;

#[derive(Args)]
pub struct MappingsArgs {
    /// Only list mappings for this provider
    #[arg(short, long)]
    provider: Option<CloudProvider>,

    /// Extra mapping files merged over the built-in tables
    #[arg(long = "mappings", value_name = "FILE")]
    mappings: Vec<PathBuf>,
}

pub async fn execute(args: MappingsArgs) -> Result<()> {
    let mut tables = MappingTables::builtin().context("Failed to load built-in mappings")?;
    for path in &args.mappings {
        tables
            .merge_file(path)
            .with_context(|| format!("Failed to merge mapping file {}", path.display()))?;
    }

    let providers = match args.provider {
        Some(provider) => vec![provider],
        None => CloudProvider::all(),
    };

    for provider in providers {
        println!("📦 {provider}");
        for resource_type in tables.resource_types(provider) {
            if let Some(spec) = tables.spec(provider, resource_type) {
                println!("   {}", describe(resource_type, spec));
            }
        }
        println!();
    }

    Ok(())
}

fn describe(resource_type: &str, spec: &ResourceSpec) -> String {
    let mut line = format!(
        "{:<20} terraform={} cloudformation={} pulumi={}",
        resource_type,
        spec.terraform.as_deref().unwrap_or("-"),
        spec.cloudformation.as_deref().unwrap_or("-"),
        spec.pulumi.as_deref().unwrap_or("-"),
    );
    if !spec.aliases.is_empty() {
        line.push_str(&format!(" (aliases: {})", spec.aliases.join(", ")));
    }
    line
}
