//! Error types for graph building.

use thiserror::Error;

use crate::provider::CloudProvider;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while reading or validating an infrastructure document.
///
/// Every variant except the reader failures (`Io`, `Json`, `Yaml`) is a
/// validation error: the document was readable but cannot form a resource graph.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Missing provider tag")]
    MissingProvider,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider mismatch: requested {requested}, document declares {found}")]
    ProviderMismatch {
        requested: CloudProvider,
        found: CloudProvider,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field {location}: {message}")]
    InvalidField { location: String, message: String },

    #[error("Duplicate resource name: {0}")]
    DuplicateName(String),

    #[error("Resource '{resource}' depends on unknown resource '{missing}'")]
    DanglingDependency { resource: String, missing: String },

    #[error("Cyclic dependency detected involving '{resource}' ({})", .cycle.join(" -> "))]
    CyclicDependency { resource: String, cycle: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GraphError {
    pub(crate) fn invalid(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Whether this error rejects the document's content rather than its encoding.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Json(_) | Self::Yaml(_))
    }

    /// Whether this error reports a dependency cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display() {
        let err = GraphError::CyclicDependency {
            resource: "a".to_string(),
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic dependency detected involving 'a' (a -> b -> a)"
        );
        assert!(err.is_cycle());
        assert!(err.is_validation());
    }

    #[test]
    fn test_reader_errors_are_not_validation() {
        let err = GraphError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!err.is_validation());
    }
}
