//! The emitter trait and shared emitter configuration.

use serde::{Deserialize, Serialize};

use infra_graph::{CloudProvider, ResourceGraph};

use crate::error::CodegenResult;
use crate::format::IacFormat;
use crate::mapping::MappingTables;
use crate::plan::EmissionPlan;

/// Renders one target syntax from a resource graph.
///
/// Implementations must be pure: same graph and tables, same bytes.
#[cfg_attr(test, mockall::automock)]
pub trait Emitter: Send + Sync {
    fn format(&self) -> IacFormat;

    fn emit(&self, graph: &ResourceGraph, tables: &MappingTables) -> CodegenResult<Emission>;
}

/// Output of a single emitter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub code: String,
    /// Resource names in emission order.
    pub resource_names: Vec<String>,
    /// Resources rendered through the unmanaged fallback.
    pub unmapped: Vec<UnmappedResource>,
}

impl Emission {
    pub(crate) fn from_plan(plan: &EmissionPlan<'_>, code: String) -> Self {
        Self {
            code,
            resource_names: plan.resource_names(),
            unmapped: plan
                .unmapped()
                .map(|e| UnmappedResource {
                    resource: e.resource.name.clone(),
                    resource_type: e.resource.resource_type.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedResource {
    pub resource: String,
    pub resource_type: String,
}

/// Options shared by the built-in emitters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Region for provider configuration; the provider default when unset.
    #[serde(default)]
    pub region: Option<String>,
    /// Write a generated-by header (and security posture) at the top.
    #[serde(default = "default_header")]
    pub header: bool,
}

fn default_header() -> bool {
    true
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            region: None,
            header: true,
        }
    }
}

impl EmitOptions {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn region_for(&self, provider: CloudProvider) -> &str {
        self.region
            .as_deref()
            .unwrap_or_else(|| provider.default_region())
    }

    /// Header lines shared by every format, without comment markers.
    pub(crate) fn header_lines(&self, plan: &EmissionPlan<'_>) -> Vec<String> {
        if !self.header {
            return Vec::new();
        }
        let mut lines = vec![format!(
            "Generated by infragen ({}, provider: {})",
            plan.format.display_name(),
            plan.provider
        )];
        if let Some(security) = plan.security {
            lines.push(format!("Security posture: {}", security.summary()));
        }
        lines
    }
}
