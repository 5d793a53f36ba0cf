//! Canonical graph builder.
//!
//! Turns an untrusted, already-parsed document into a [`ResourceGraph`]. The
//! builder is fail-fast: the first structural problem is reported and no graph
//! is produced.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::graph::ResourceGraph;
use crate::models::{CanonicalResource, NetworkConfiguration, SecurityConfiguration};
use crate::network::lower_network;
use crate::provider::CloudProvider;
use crate::value::PropertyMap;

/// Builder options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderOptions {
    /// Expand the network block into VPC, subnet and security group resources.
    pub lower_network: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            lower_network: true,
        }
    }
}

/// Builds a [`ResourceGraph`] for one requested provider.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    provider: CloudProvider,
    options: BuilderOptions,
}

impl GraphBuilder {
    pub fn new(provider: CloudProvider) -> Self {
        Self {
            provider,
            options: BuilderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuilderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn lower_network(mut self, enabled: bool) -> Self {
        self.options.lower_network = enabled;
        self
    }

    /// Validate a document and build its graph.
    pub fn build(&self, document: &Value) -> GraphResult<ResourceGraph> {
        let root = document
            .as_object()
            .ok_or_else(|| GraphError::invalid("$", "document must be an object"))?;

        self.check_provider(root.get("provider"))?;

        let explicit = match root.get("resources") {
            None | Some(Value::Null) => return Err(GraphError::MissingField("resources".to_string())),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| parse_resource(item, idx))
                .collect::<GraphResult<Vec<_>>>()?,
            Some(_) => return Err(GraphError::invalid("resources", "expected an array")),
        };

        let network: Option<NetworkConfiguration> = parse_optional(root.get("network"), "network")?;
        let security: Option<SecurityConfiguration> =
            parse_optional(root.get("security"), "security")?;

        let mut resources = Vec::with_capacity(explicit.len());
        if self.options.lower_network {
            if let Some(net) = &network {
                let explicit_names: HashSet<&str> = explicit.iter().map(|r| r.name.as_str()).collect();
                for lowered in lower_network(net)? {
                    if explicit_names.contains(lowered.name.as_str()) {
                        debug!(
                            "Network entry '{}' shadowed by an explicit resource",
                            lowered.name
                        );
                        continue;
                    }
                    resources.push(lowered);
                }
            }
        }
        resources.extend(explicit);

        check_unique_names(&resources)?;
        check_dependencies(&resources)?;

        let graph = ResourceGraph::from_resolved(self.provider, resources, network, security);
        check_acyclic(&graph)?;

        info!(
            "Built {} graph with {} resources",
            graph.provider(),
            graph.len()
        );
        Ok(graph)
    }

    fn check_provider(&self, raw: Option<&Value>) -> GraphResult<()> {
        let tag = match raw {
            None | Some(Value::Null) => return Err(GraphError::MissingProvider),
            Some(Value::String(s)) if s.trim().is_empty() => return Err(GraphError::MissingProvider),
            Some(Value::String(s)) => s,
            Some(_) => return Err(GraphError::invalid("provider", "expected a string")),
        };

        let found: CloudProvider = tag.parse()?;
        if found != self.provider {
            return Err(GraphError::ProviderMismatch {
                requested: self.provider,
                found,
            });
        }
        Ok(())
    }
}

fn parse_resource(item: &Value, idx: usize) -> GraphResult<CanonicalResource> {
    let location = format!("resources[{idx}]");
    let object = item
        .as_object()
        .ok_or_else(|| GraphError::invalid(&location, "expected an object"))?;

    let resource_type = required_string(object.get("type"), &location, "type")?;
    let name = required_string(object.get("name"), &location, "name")?;

    let properties = match object.get("properties") {
        None | Some(Value::Null) => PropertyMap::new(),
        Some(Value::Object(props)) => {
            PropertyMap::from_json_object(props, &format!("{location}.properties"))?
        }
        Some(_) => {
            return Err(GraphError::invalid(
                format!("{location}.properties"),
                "expected an object",
            ))
        }
    };

    let mut resource = CanonicalResource::new(resource_type, name).with_properties(properties);
    match object.get("dependencies") {
        None | Some(Value::Null) => {}
        Some(Value::Array(deps)) => {
            for (dep_idx, dep) in deps.iter().enumerate() {
                let dep = dep.as_str().map(str::trim).filter(|d| !d.is_empty()).ok_or_else(|| {
                    GraphError::invalid(
                        format!("{location}.dependencies[{dep_idx}]"),
                        "expected a non-empty string",
                    )
                })?;
                resource = resource.with_dependency(dep);
            }
        }
        Some(_) => {
            return Err(GraphError::invalid(
                format!("{location}.dependencies"),
                "expected an array of names",
            ))
        }
    }

    Ok(resource)
}

fn required_string(raw: Option<&Value>, location: &str, field: &str) -> GraphResult<String> {
    match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(GraphError::MissingField(format!("{location}.{field}")))
        }
        Some(_) => Err(GraphError::invalid(
            format!("{location}.{field}"),
            "expected a string",
        )),
    }
}

fn parse_optional<T: serde::de::DeserializeOwned>(
    raw: Option<&Value>,
    location: &str,
) -> GraphResult<Option<T>> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| GraphError::invalid(location, e.to_string())),
    }
}

fn check_unique_names(resources: &[CanonicalResource]) -> GraphResult<()> {
    let mut seen = HashSet::with_capacity(resources.len());
    for resource in resources {
        if !seen.insert(resource.name.as_str()) {
            return Err(GraphError::DuplicateName(resource.name.clone()));
        }
    }
    Ok(())
}

fn check_dependencies(resources: &[CanonicalResource]) -> GraphResult<()> {
    let names: HashSet<&str> = resources.iter().map(|r| r.name.as_str()).collect();
    for resource in resources {
        if let Some(missing) = resource
            .dependencies
            .iter()
            .find(|d| !names.contains(d.as_str()))
        {
            return Err(GraphError::DanglingDependency {
                resource: resource.name.clone(),
                missing: missing.clone(),
            });
        }
    }
    Ok(())
}

fn check_acyclic(graph: &ResourceGraph) -> GraphResult<()> {
    let (_, remaining) = graph.kahn();
    if remaining.is_empty() {
        return Ok(());
    }

    let names = |indices: &[usize]| -> Vec<String> {
        indices
            .iter()
            .map(|&i| graph.resources()[i].name.clone())
            .collect()
    };

    let cycle = graph
        .find_cycle(&remaining)
        .map(|c| names(&c))
        .unwrap_or_else(|| names(&remaining));
    Err(GraphError::CyclicDependency {
        resource: cycle.first().cloned().unwrap_or_default(),
        cycle,
    })
}
