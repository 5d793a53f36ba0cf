//! `infragen.toml` configuration.
//!
//! Every field is optional; command-line flags take precedence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use infra_codegen::IacFormat;
use infra_graph::CloudProvider;

pub const CONFIG_FILE_NAME: &str = "infragen.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Provider used when `--provider` is not given and the document has none.
    pub provider: Option<CloudProvider>,
    /// Formats used when no `--format` is given.
    pub formats: Vec<IacFormat>,
    pub region: Option<String>,
    pub out_dir: Option<PathBuf>,
    /// Extra mapping files merged over the built-in tables, in order.
    pub mappings: Vec<PathBuf>,
    pub parallel: bool,
    pub lower_network: Option<bool>,
    pub header: Option<bool>,
}

impl CliConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid infragen configuration")
    }

    /// Load a config file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.mappings = config
                .mappings
                .into_iter()
                .map(|p| if p.is_relative() { base.join(p) } else { p })
                .collect();
            config.out_dir = config
                .out_dir
                .map(|p| if p.is_relative() { base.join(p) } else { p });
        }

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` if given, else `infragen.toml` in `dir` if present,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_config() {
        let config = CliConfig::from_toml_str(
            r#"
provider = "azure"
formats = ["terraform", "pulumi-typescript"]
region = "westeurope"
out_dir = "generated"
mappings = ["extra.yaml"]
parallel = true
lower_network = false
"#,
        )
        .unwrap();

        assert_eq!(config.provider, Some(CloudProvider::Azure));
        assert_eq!(
            config.formats,
            vec![IacFormat::Terraform, IacFormat::PulumiTypescript]
        );
        assert!(config.parallel);
        assert_eq!(config.lower_network, Some(false));
        assert_eq!(config.header, None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(CliConfig::from_toml_str("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_discover_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "mappings = [\"maps/extra.yaml\"]\nout_dir = \"out\"\n",
        )
        .unwrap();

        let config = CliConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.mappings, vec![dir.path().join("maps/extra.yaml")]);
        assert_eq!(config.out_dir, Some(dir.path().join("out")));
    }

    #[test]
    fn test_discover_defaults_without_file() {
        let dir = tempdir().unwrap();
        assert_eq!(CliConfig::discover(None, dir.path()).unwrap(), CliConfig::default());
        assert!(CliConfig::discover(Some(&dir.path().join("missing.toml")), dir.path()).is_err());
    }
}
