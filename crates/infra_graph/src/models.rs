//! Data models for canonical infrastructure descriptions.

use serde::{Deserialize, Serialize};

use crate::value::PropertyMap;

/// A provider-neutral description of one infrastructure component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalResource {
    /// Canonical or provider-specific type identifier (`instance`, `aws_instance`).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Unique name within the graph.
    pub name: String,
    pub properties: PropertyMap,
    /// Names of resources this one depends on, de-duplicated, in declaration order.
    pub dependencies: Vec<String>,
}

impl CanonicalResource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            properties: PropertyMap::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.dependencies.contains(&name) {
            self.dependencies.push(name);
        }
        self
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }
}

/// Optional network layout accompanying the resource list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    #[serde(default)]
    pub vpcs: Vec<VpcSpec>,
    #[serde(default)]
    pub subnets: Vec<SubnetSpec>,
    #[serde(default)]
    pub security_groups: Vec<SecurityGroupSpec>,
}

impl NetworkConfiguration {
    pub fn is_empty(&self) -> bool {
        self.vpcs.is_empty() && self.subnets.is_empty() && self.security_groups.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcSpec {
    pub cidr: String,
    pub name: String,
    #[serde(default)]
    pub enable_dns_hostnames: Option<bool>,
    #[serde(default)]
    pub enable_dns_support: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    pub cidr: String,
    pub name: String,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingress: Vec<SecurityRule>,
    #[serde(default)]
    pub egress: Vec<SecurityRule>,
}

/// A single ingress or egress rule.
///
/// Exactly one of `cidr` and `source_security_group` is expected; the builder
/// enforces this when lowering the network block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    pub protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default)]
    pub source_security_group: Option<String>,
}

/// Flat security posture record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfiguration {
    #[serde(default)]
    pub encryption: Option<bool>,
    #[serde(default)]
    pub public_access: Option<bool>,
    #[serde(default)]
    pub authentication: Option<String>,
}

impl SecurityConfiguration {
    /// One-line summary used in generated file headers.
    pub fn summary(&self) -> String {
        fn flag(value: Option<bool>) -> &'static str {
            match value {
                Some(true) => "enabled",
                Some(false) => "disabled",
                None => "unspecified",
            }
        }

        format!(
            "encryption={}, public access={}, authentication={}",
            flag(self.encryption),
            flag(self.public_access),
            self.authentication.as_deref().unwrap_or("unspecified")
        )
    }
}
