//! infragen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 5: IaC generation error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use infra_codegen::CodegenError;
use infra_graph::GraphError;

mod commands;
mod config;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const CODEGEN_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so generated code can be piped from stdout
    let default_directive = if cli.verbose {
        "infragen=debug,infra_graph=debug,infra_codegen=debug,warn"
    } else if cli.quiet {
        "error"
    } else {
        "infragen=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    // Ignore a subscriber that is already installed
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Convert(args) => commands::convert::execute(args).await,
        Commands::Formats(args) => commands::formats::execute(args).await,
        Commands::Mappings(args) => commands::mappings::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(err) = e.downcast_ref::<CodegenError>() {
        return match err {
            CodegenError::Graph(graph) => graph_exit_code(graph),
            CodegenError::NoFormatsRequested
            | CodegenError::UnknownFormat(_)
            | CodegenError::UnsupportedFormat { .. } => ExitCodes::INVALID_ARGS,
            CodegenError::Mapping(_)
            | CodegenError::Emission { .. }
            | CodegenError::Yaml(_) => ExitCodes::CODEGEN_ERROR,
            CodegenError::Io(_) => ExitCodes::GENERAL_ERROR,
        };
    }
    if let Some(err) = e.downcast_ref::<GraphError>() {
        return graph_exit_code(err);
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("validation") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("iac") || msg.contains("mapping") {
        ExitCodes::CODEGEN_ERROR
    } else if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

fn graph_exit_code(err: &GraphError) -> u8 {
    if err.is_validation() {
        ExitCodes::VALIDATION_FAILURE
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use infra_codegen::IacFormat;
    use infra_graph::CloudProvider;

    #[test]
    fn test_categorize_typed_errors() {
        let cycle = anyhow::Error::new(CodegenError::Graph(GraphError::CyclicDependency {
            resource: "a".to_string(),
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        }));
        assert_eq!(categorize_error(&cycle), ExitCodes::VALIDATION_FAILURE);

        let unsupported = anyhow::Error::new(CodegenError::UnsupportedFormat {
            format: IacFormat::CloudFormation,
            provider: CloudProvider::Gcp,
        });
        assert_eq!(categorize_error(&unsupported), ExitCodes::INVALID_ARGS);

        let io: Result<(), GraphError> = Err(GraphError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        )));
        let wrapped = io.context("Failed to read input document").unwrap_err();
        assert_eq!(categorize_error(&wrapped), ExitCodes::GENERAL_ERROR);
    }

    #[test]
    fn test_categorize_messages() {
        let missing = anyhow::anyhow!("Missing argument: pass --provider");
        assert_eq!(categorize_error(&missing), ExitCodes::INVALID_ARGS);
        let empty = anyhow::anyhow!("IaC generation failed: no artifacts were produced");
        assert_eq!(categorize_error(&empty), ExitCodes::CODEGEN_ERROR);
    }
}
