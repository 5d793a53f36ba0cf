//! Error types for code generation.

use thiserror::Error;

use infra_graph::{CloudProvider, GraphError};

use crate::format::IacFormat;

/// Result type alias for codegen operations.
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Errors that can occur during code generation.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("No output formats requested")]
    NoFormatsRequested,

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Format {format} is not supported for provider {provider}")]
    UnsupportedFormat {
        format: IacFormat,
        provider: CloudProvider,
    },

    #[error("Invalid mapping table: {0}")]
    Mapping(String),

    #[error("{format} emission failed: {message}")]
    Emission { format: IacFormat, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CodegenError {
    pub(crate) fn emission(format: IacFormat, message: impl Into<String>) -> Self {
        Self::Emission {
            format,
            message: message.into(),
        }
    }

    /// Whether the request was rejected because the input graph is invalid.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Graph(e) if e.is_validation())
    }
}
