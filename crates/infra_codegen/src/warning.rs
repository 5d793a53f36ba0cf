//! Generation results and non-fatal warnings.

use serde::Serialize;

use crate::format::IacFormat;

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    pub format: IacFormat,
    pub code: String,
    pub filename: String,
    /// Resource names in the order they appear in `code`.
    pub resource_names: Vec<String>,
}

/// A problem scoped to one resource or one format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationWarning {
    /// The resource type has no mapping; a generic construct was emitted.
    UnmappedResource {
        resource: String,
        resource_type: String,
        format: IacFormat,
    },
    /// The emitter failed; the format's artifact was dropped.
    EmissionFailed { format: IacFormat, message: String },
}

impl GenerationWarning {
    pub fn format(&self) -> IacFormat {
        match self {
            GenerationWarning::UnmappedResource { format, .. } => *format,
            GenerationWarning::EmissionFailed { format, .. } => *format,
        }
    }
}

impl std::fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationWarning::UnmappedResource {
                resource,
                resource_type,
                format,
            } => write!(
                f,
                "{format}: resource '{resource}' has unmapped type '{resource_type}'; emitted as a generic construct"
            ),
            GenerationWarning::EmissionFailed { format, message } => {
                write!(f, "{format}: artifact omitted: {message}")
            }
        }
    }
}

/// Artifacts in requested-format order plus warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub artifacts: Vec<GeneratedArtifact>,
    pub warnings: Vec<GenerationWarning>,
}

impl GenerationReport {
    pub fn artifact(&self, format: IacFormat) -> Option<&GeneratedArtifact> {
        self.artifacts.iter().find(|a| a.format == format)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
