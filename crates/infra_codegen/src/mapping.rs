//! Type and property mapping tables.
//!
//! Tables are plain data keyed by provider and canonical resource type. The
//! built-in set is embedded from `mappings/builtin.yaml`; extra YAML files can
//! be merged on top, replacing entries with the same provider and type.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use infra_graph::CloudProvider;

use crate::error::CodegenResult;
use crate::format::IacFormat;

const BUILTIN_MAPPINGS: &str = include_str!("../mappings/builtin.yaml");

/// Serialized form of a mapping file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Properties whose nested keys are emitted verbatim (e.g. `tags`).
    #[serde(default)]
    pub opaque_properties: Vec<String>,
    /// Pulumi namespaces keyed by the alias used in class paths.
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceSpec>,
    /// Terraform providers keyed by resource-type prefix.
    #[serde(default)]
    pub terraform_providers: BTreeMap<String, TerraformProviderSpec>,
    #[serde(default)]
    pub resources: BTreeMap<CloudProvider, BTreeMap<String, ResourceSpec>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSpec {
    pub python_module: String,
    pub typescript_package: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerraformProviderSpec {
    pub source: String,
    pub version: String,
}

/// Emission metadata for one canonical resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub terraform: Option<String>,
    #[serde(default)]
    pub cloudformation: Option<String>,
    #[serde(default)]
    pub pulumi: Option<String>,
    #[serde(default)]
    pub pulumi_python: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyRename>,
}

/// Per-format names for one canonical property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRename {
    #[serde(default)]
    pub terraform: Option<String>,
    #[serde(default)]
    pub cloudformation: Option<String>,
    #[serde(default)]
    pub pulumi_python: Option<String>,
    #[serde(default)]
    pub pulumi_typescript: Option<String>,
}

impl PropertyRename {
    fn for_format(&self, format: IacFormat) -> Option<&str> {
        match format {
            IacFormat::Terraform => self.terraform.as_deref(),
            IacFormat::CloudFormation => self.cloudformation.as_deref(),
            IacFormat::PulumiPython => self.pulumi_python.as_deref(),
            IacFormat::PulumiTypescript => self.pulumi_typescript.as_deref(),
        }
    }
}

/// A mapping entry resolved for one format.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedMapping<'a> {
    /// Canonical type key the input type resolved to.
    pub canonical_type: &'a str,
    /// Format-specific resource type or class path.
    pub target: &'a str,
    spec: &'a ResourceSpec,
    format: IacFormat,
}

impl<'a> ResolvedMapping<'a> {
    /// Explicit rename for a canonical property key, if the table has one.
    pub fn property_key(&self, key: &str) -> Option<&'a str> {
        self.spec
            .properties
            .get(key)
            .and_then(|rename| rename.for_format(self.format))
    }
}

/// Lookup tables for every provider.
#[derive(Debug, Clone)]
pub struct MappingTables {
    document: MappingDocument,
    opaque: HashSet<String>,
    index: HashMap<(CloudProvider, String), String>,
}

impl MappingTables {
    /// The built-in tables shipped with the crate.
    pub fn builtin() -> CodegenResult<Self> {
        Self::from_yaml_str(BUILTIN_MAPPINGS)
    }

    pub fn from_yaml_str(content: &str) -> CodegenResult<Self> {
        let document: MappingDocument = serde_yaml::from_str(content)?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: MappingDocument) -> Self {
        let mut tables = Self {
            document,
            opaque: HashSet::new(),
            index: HashMap::new(),
        };
        tables.reindex();
        tables
    }

    /// Merge a mapping file on top of these tables.
    pub fn merge_file(&mut self, path: impl AsRef<Path>) -> CodegenResult<()> {
        let path = path.as_ref();
        debug!("Merging mapping overrides from {:?}", path);
        let content = fs::read_to_string(path)?;
        let overrides: MappingDocument = serde_yaml::from_str(&content)?;
        self.merge(overrides);
        Ok(())
    }

    /// Merge another document. Entries with the same key are replaced.
    pub fn merge(&mut self, other: MappingDocument) {
        for key in other.opaque_properties {
            if !self.document.opaque_properties.contains(&key) {
                self.document.opaque_properties.push(key);
            }
        }
        self.document.namespaces.extend(other.namespaces);
        self.document
            .terraform_providers
            .extend(other.terraform_providers);
        for (provider, entries) in other.resources {
            self.document
                .resources
                .entry(provider)
                .or_default()
                .extend(entries);
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        self.opaque = self
            .document
            .opaque_properties
            .iter()
            .map(|k| normalize_type(k))
            .collect();

        self.index.clear();
        for (provider, entries) in &self.document.resources {
            // Canonical keys win over aliases and target identifiers.
            for key in entries.keys() {
                self.index
                    .insert((*provider, normalize_type(key)), key.clone());
            }
            for (key, spec) in entries {
                let spellings = spec
                    .aliases
                    .iter()
                    .chain(spec.terraform.iter())
                    .chain(spec.cloudformation.iter())
                    .chain(spec.pulumi.iter())
                    .chain(spec.pulumi_python.iter());
                for spelling in spellings {
                    self.index
                        .entry((*provider, normalize_type(spelling)))
                        .or_insert_with(|| key.clone());
                }
            }
        }
    }

    /// Resolve an input type for one provider and format.
    ///
    /// Returns `None` when the type is unknown or has no target for `format`.
    pub fn resolve(
        &self,
        provider: CloudProvider,
        resource_type: &str,
        format: IacFormat,
    ) -> Option<ResolvedMapping<'_>> {
        let canonical = self.index.get(&(provider, normalize_type(resource_type)))?;
        let (canonical_type, spec) = self
            .document
            .resources
            .get(&provider)?
            .get_key_value(canonical)?;

        let target = match format {
            IacFormat::Terraform => spec.terraform.as_deref(),
            IacFormat::CloudFormation => spec.cloudformation.as_deref(),
            IacFormat::PulumiPython => spec.pulumi_python.as_deref().or(spec.pulumi.as_deref()),
            IacFormat::PulumiTypescript => spec.pulumi.as_deref(),
        }?;

        Some(ResolvedMapping {
            canonical_type,
            target,
            spec,
            format,
        })
    }

    /// Whether nested keys under this property are emitted verbatim.
    pub fn is_opaque(&self, property: &str) -> bool {
        self.opaque.contains(&normalize_type(property))
    }

    pub fn namespace(&self, alias: &str) -> Option<&NamespaceSpec> {
        self.document.namespaces.get(alias)
    }

    /// All namespace aliases, sorted.
    pub fn namespace_aliases(&self) -> impl Iterator<Item = &str> {
        self.document.namespaces.keys().map(String::as_str)
    }

    pub fn terraform_provider(&self, prefix: &str) -> Option<&TerraformProviderSpec> {
        self.document.terraform_providers.get(prefix)
    }

    /// Canonical types mapped for a provider, sorted.
    pub fn resource_types(&self, provider: CloudProvider) -> Vec<&str> {
        self.document
            .resources
            .get(&provider)
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn spec(&self, provider: CloudProvider, canonical_type: &str) -> Option<&ResourceSpec> {
        self.document.resources.get(&provider)?.get(canonical_type)
    }
}

/// Normalize a type spelling for lookup: trimmed, lowercase, `_` and spaces as `-`.
pub fn normalize_type(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_parses() {
        let tables = MappingTables::builtin().unwrap();
        for provider in CloudProvider::all() {
            assert!(!tables.resource_types(provider).is_empty());
        }
        assert!(tables.namespace("aws").is_some());
        assert!(tables.terraform_provider("azurerm").is_some());
    }

    #[test]
    fn test_builtin_namespaces_are_declared() {
        let tables = MappingTables::builtin().unwrap();
        for provider in CloudProvider::all() {
            for ty in tables.resource_types(provider) {
                for format in [IacFormat::PulumiPython, IacFormat::PulumiTypescript] {
                    let resolved = tables.resolve(provider, ty, format).unwrap();
                    let ns = resolved.target.split('.').next().unwrap();
                    assert!(tables.namespace(ns).is_some(), "{provider}/{ty} uses undeclared {ns}");
                }
            }
        }
    }

    #[test]
    fn test_resolve_by_alias_and_target() {
        let tables = MappingTables::builtin().unwrap();

        let by_alias = tables.resolve(CloudProvider::Aws, "EC2", IacFormat::Terraform).unwrap();
        assert_eq!(by_alias.canonical_type, "instance");
        assert_eq!(by_alias.target, "aws_instance");

        let by_target = tables
            .resolve(CloudProvider::Aws, "aws_s3_bucket", IacFormat::CloudFormation)
            .unwrap();
        assert_eq!(by_target.target, "AWS::S3::Bucket");

        let spaced = tables
            .resolve(CloudProvider::Aws, "Security Group", IacFormat::PulumiTypescript)
            .unwrap();
        assert_eq!(spaced.target, "aws.ec2.SecurityGroup");
    }

    #[test]
    fn test_missing_format_target_is_unmapped() {
        let tables = MappingTables::builtin().unwrap();
        assert!(tables
            .resolve(CloudProvider::Azure, "vm", IacFormat::CloudFormation)
            .is_none());
        assert!(tables
            .resolve(CloudProvider::Aws, "random-password", IacFormat::CloudFormation)
            .is_none());
        assert!(tables
            .resolve(CloudProvider::Aws, "exotic-service", IacFormat::Terraform)
            .is_none());
    }

    #[test]
    fn test_python_override_path() {
        let tables = MappingTables::builtin().unwrap();
        let py = tables.resolve(CloudProvider::Aws, "lambda", IacFormat::PulumiPython).unwrap();
        let ts = tables.resolve(CloudProvider::Aws, "lambda", IacFormat::PulumiTypescript).unwrap();
        assert_eq!(py.target, "aws.lambda_.Function");
        assert_eq!(ts.target, "aws.lambda.Function");
    }

    #[test]
    fn test_property_renames() {
        let tables = MappingTables::builtin().unwrap();
        let sg = tables
            .resolve(CloudProvider::Aws, "security-group", IacFormat::CloudFormation)
            .unwrap();
        assert_eq!(sg.property_key("description"), Some("GroupDescription"));
        assert_eq!(sg.property_key("vpc_id"), None);
    }

    #[test]
    fn test_merge_replaces_and_extends() {
        let mut tables = MappingTables::builtin().unwrap();
        let overrides: MappingDocument = serde_yaml::from_str(
            r#"
opaque_properties: [annotations]
resources:
  aws:
    exotic-service:
      terraform: aws_exotic_thing
      pulumi: aws.exotic.Thing
    bucket:
      terraform: aws_s3_directory_bucket
"#,
        )
        .unwrap();
        tables.merge(overrides);

        assert!(tables.resolve(CloudProvider::Aws, "exotic_service", IacFormat::Terraform).is_some());
        let bucket = tables.resolve(CloudProvider::Aws, "bucket", IacFormat::Terraform).unwrap();
        assert_eq!(bucket.target, "aws_s3_directory_bucket");
        assert!(tables.resolve(CloudProvider::Aws, "bucket", IacFormat::CloudFormation).is_none());
        assert!(tables.is_opaque("annotations"));
        assert!(tables.is_opaque("tags"));
    }
}
