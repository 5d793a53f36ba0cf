//! CLI command definitions.
//!
//! Each subcommand maps to one operation of the generation engine.

use clap::{Parser, Subcommand};

pub mod convert;
pub mod formats;
pub mod mappings;

/// infragen - multi-target Infrastructure-as-Code generator
#[derive(Parser)]
#[command(name = "infragen")]
#[command(version, about = "infragen - multi-target Infrastructure-as-Code generator")]
#[command(long_about = r#"
infragen turns a provider-neutral infrastructure description into
Terraform, CloudFormation, Pulumi Python and Pulumi TypeScript code.

COMMANDS:
  convert   → Generate IaC artifacts from an infrastructure document
  formats   → List supported output formats
  mappings  → List resource types with a mapping per provider

CONFIGURATION:
  Settings are read from ./infragen.toml (or --config FILE) when present.
  Command-line flags override file values.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  5 - IaC generation error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate IaC artifacts from an infrastructure document
    Convert(convert::ConvertArgs),

    /// List supported output formats
    Formats(formats::FormatsArgs),

    /// List mapped resource types
    Mappings(mappings::MappingsArgs),
}
