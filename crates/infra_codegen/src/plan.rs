//! Format-neutral emission plan.
//!
//! Every emitter starts from an [`EmissionPlan`]: resources in topological
//! order, each with a unique identifier for the target format, its resolved
//! mapping (if any), and a property bag whose keys are already renamed and
//! whose dependency names are already turned into references. Emitters only
//! deal with syntax.

use std::collections::HashMap;

use serde_json::Number;
use tracing::debug;

use infra_graph::{
    CanonicalResource, CloudProvider, PropertyMap, PropertyValue, ResourceGraph,
    SecurityConfiguration,
};

use crate::error::{CodegenError, CodegenResult};
use crate::format::IacFormat;
use crate::mapping::{MappingTables, ResolvedMapping};
use crate::naming::{attribute_key, convert_key, validate_target, NameTable};

/// A property value ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanValue {
    String(String),
    Number(Number),
    Bool(bool),
    /// Reference to another planned resource, by plan index.
    Reference(usize),
    List(Vec<PlanValue>),
    Map(Vec<PlanProperty>),
}

impl PlanValue {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            PlanValue::String(_) | PlanValue::Number(_) | PlanValue::Bool(_) | PlanValue::Reference(_)
        )
    }
}

/// One key/value pair. `source_key` is the key as written in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanProperty {
    pub source_key: String,
    pub key: String,
    pub value: PlanValue,
}

/// One resource in emission order.
#[derive(Debug, Clone)]
pub struct PlannedResource<'a> {
    pub resource: &'a CanonicalResource,
    /// Sanitized, unique identifier in the target format.
    pub ident: String,
    /// `None` when the type has no mapping for this provider and format.
    pub mapping: Option<ResolvedMapping<'a>>,
    pub properties: Vec<PlanProperty>,
    /// Declared dependencies as plan indices, in declaration order.
    pub dependencies: Vec<usize>,
}

impl PlannedResource<'_> {
    pub fn name(&self) -> &str {
        &self.resource.name
    }

    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct EmissionPlan<'a> {
    pub format: IacFormat,
    pub provider: CloudProvider,
    pub security: Option<&'a SecurityConfiguration>,
    pub entries: Vec<PlannedResource<'a>>,
}

impl<'a> EmissionPlan<'a> {
    /// Plan a graph for one format. `reserved` lists identifiers resources
    /// must not take (import aliases and the like).
    pub fn build(
        graph: &'a ResourceGraph,
        tables: &'a MappingTables,
        format: IacFormat,
        reserved: &[&str],
    ) -> CodegenResult<Self> {
        let provider = graph.provider();
        let order = graph.topological_order();

        let names = NameTable::new(
            format,
            order.iter().map(|&i| graph.resources()[i].name.as_str()),
            reserved,
        );

        let mut position = vec![0; graph.len()];
        for (pos, &idx) in order.iter().enumerate() {
            position[idx] = pos;
        }

        let mut entries = Vec::with_capacity(order.len());
        for &idx in &order {
            let resource = &graph.resources()[idx];
            let mapping = tables.resolve(provider, &resource.resource_type, format);
            if let Some(m) = &mapping {
                validate_target(format, m.target)?;
            }

            let references: HashMap<&str, usize> = graph
                .dependencies_of(idx)
                .iter()
                .map(|&dep| (graph.resources()[dep].name.as_str(), position[dep]))
                .collect();

            let converter = Converter {
                format,
                tables,
                resource: &resource.name,
                mapping: mapping.as_ref(),
                references: &references,
            };
            let properties = converter.top_level(&resource.properties)?;

            let dependencies = resource
                .dependencies
                .iter()
                .filter_map(|dep| references.get(dep.as_str()).copied())
                .collect();

            let ident = names
                .get(&resource.name)
                .map(str::to_string)
                .unwrap_or_else(|| resource.name.clone());

            debug!(
                "Planned {} '{}' as {} ({})",
                format,
                resource.name,
                ident,
                mapping.as_ref().map_or("unmapped", |m| m.target)
            );

            entries.push(PlannedResource {
                resource,
                ident,
                mapping,
                properties,
                dependencies,
            });
        }

        Ok(Self {
            format,
            provider,
            security: graph.security(),
            entries,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original resource names in emission order.
    pub fn resource_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.resource.name.clone()).collect()
    }

    pub fn unmapped(&self) -> impl Iterator<Item = &PlannedResource<'a>> {
        self.entries.iter().filter(|e| e.mapping.is_none())
    }

    pub fn entry(&self, idx: usize) -> &PlannedResource<'a> {
        &self.entries[idx]
    }
}

struct Converter<'c> {
    format: IacFormat,
    tables: &'c MappingTables,
    resource: &'c str,
    mapping: Option<&'c ResolvedMapping<'c>>,
    references: &'c HashMap<&'c str, usize>,
}

impl Converter<'_> {
    fn top_level(&self, properties: &PropertyMap) -> CodegenResult<Vec<PlanProperty>> {
        let props = properties
            .iter()
            .map(|(key, value)| {
                let (renamed, convert_nested) = match self.mapping {
                    Some(mapping) => (
                        mapping
                            .property_key(key)
                            .map(str::to_string)
                            .unwrap_or_else(|| convert_key(self.format, key)),
                        !self.tables.is_opaque(key),
                    ),
                    None => (key.to_string(), false),
                };
                Ok(PlanProperty {
                    source_key: key.to_string(),
                    key: renamed,
                    value: self.value(value, convert_nested, false)?,
                })
            })
            .collect::<CodegenResult<Vec<_>>>()?;

        // Unmapped bags keep their input keys, which are already unique.
        if self.mapping.is_some() {
            self.check_unique(&props, |key| attribute_key(self.format, key))?;
        }
        Ok(props)
    }

    fn value(
        &self,
        value: &PropertyValue,
        convert_keys: bool,
        in_list: bool,
    ) -> CodegenResult<PlanValue> {
        Ok(match value {
            PropertyValue::String(s) => {
                // Unmapped resources are carried verbatim.
                match self.mapping.and_then(|_| self.references.get(s.as_str())) {
                    Some(&target) => PlanValue::Reference(target),
                    None => PlanValue::String(s.clone()),
                }
            }
            PropertyValue::Number(n) => PlanValue::Number(n.clone()),
            PropertyValue::Bool(b) => PlanValue::Bool(*b),
            PropertyValue::List(items) => PlanValue::List(
                items
                    .iter()
                    .map(|v| self.value(v, convert_keys, true))
                    .collect::<CodegenResult<_>>()?,
            ),
            PropertyValue::Map(map) => {
                let props = map
                    .iter()
                    .map(|(key, v)| {
                        Ok(PlanProperty {
                            source_key: key.to_string(),
                            key: if convert_keys {
                                convert_key(self.format, key)
                            } else {
                                key.to_string()
                            },
                            value: self.value(v, convert_keys, false)?,
                        })
                    })
                    .collect::<CodegenResult<Vec<_>>>()?;
                // Maps inside HCL lists may render as nested blocks.
                if in_list && self.format == IacFormat::Terraform {
                    self.check_unique(&props, |key| attribute_key(self.format, key))?;
                } else {
                    self.check_unique(&props, str::to_string)?;
                }
                PlanValue::Map(props)
            }
        })
    }

    /// Two input keys must never render as the same key.
    fn check_unique(
        &self,
        props: &[PlanProperty],
        rendered: impl Fn(&str) -> String,
    ) -> CodegenResult<()> {
        let mut seen: HashMap<String, &str> = HashMap::with_capacity(props.len());
        for prop in props {
            let name = rendered(&prop.key);
            if let Some(first) = seen.get(&name) {
                return Err(CodegenError::emission(
                    self.format,
                    format!(
                        "resource '{}': properties '{}' and '{}' both render as '{}'",
                        self.resource, first, prop.source_key, name
                    ),
                ));
            }
            seen.insert(name, &prop.source_key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_graph::{DocumentReader, GraphBuilder};

    fn graph(json: &str) -> ResourceGraph {
        let doc = DocumentReader::from_json_str(json).unwrap();
        GraphBuilder::new(CloudProvider::Aws).build(&doc).unwrap()
    }

    fn sample() -> ResourceGraph {
        graph(
            r#"{
                "provider": "aws",
                "resources": [
                    {"type": "instance", "name": "web-instance",
                     "properties": {"instanceType": "t3.micro", "vpc_security_group_ids": ["web-sg"],
                                    "tags": {"Name": "web", "cost_center": "ops"}},
                     "dependencies": ["web-sg"]},
                    {"type": "security-group", "name": "web-sg",
                     "properties": {"description": "web", "ingress": [{"fromPort": 80}]}},
                    {"type": "exotic-service", "name": "thing",
                     "properties": {"someKey": "web-sg"}, "dependencies": ["web-sg"]}
                ]
            }"#,
        )
    }

    #[test]
    fn test_plan_order_and_names() {
        let g = sample();
        let tables = MappingTables::builtin().unwrap();
        let plan = EmissionPlan::build(&g, &tables, IacFormat::Terraform, &[]).unwrap();

        assert_eq!(plan.resource_names(), vec!["web-sg", "web-instance", "thing"]);
        assert_eq!(plan.entry(0).ident, "web_sg");
        assert_eq!(plan.entry(1).dependencies, vec![0]);
        assert_eq!(plan.unmapped().count(), 1);
    }

    #[test]
    fn test_keys_follow_format_convention() {
        let g = sample();
        let tables = MappingTables::builtin().unwrap();
        let plan = EmissionPlan::build(&g, &tables, IacFormat::CloudFormation, &[]).unwrap();

        let sg = plan.entry(0);
        assert_eq!(sg.properties[0].key, "GroupDescription");
        assert_eq!(sg.properties[1].key, "SecurityGroupIngress");
        match &sg.properties[1].value {
            PlanValue::List(items) => match &items[0] {
                PlanValue::Map(props) => assert_eq!(props[0].key, "FromPort"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }

        let instance = plan.entry(1);
        assert_eq!(instance.properties[0].key, "InstanceType");
        assert_eq!(instance.properties[1].key, "SecurityGroupIds");
        match &instance.properties[2].value {
            PlanValue::Map(tags) => {
                assert_eq!(tags[1].key, "cost_center");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dependency_names_become_references() {
        let g = sample();
        let tables = MappingTables::builtin().unwrap();
        let plan = EmissionPlan::build(&g, &tables, IacFormat::PulumiTypescript, &[]).unwrap();

        let instance = plan.entry(1);
        assert_eq!(
            instance.properties[1].value,
            PlanValue::List(vec![PlanValue::Reference(0)])
        );

        // Unmapped resources keep keys and values verbatim.
        let thing = plan.entry(2);
        assert_eq!(thing.properties[0].key, "someKey");
        assert_eq!(thing.properties[0].value, PlanValue::String("web-sg".into()));
    }

    #[test]
    fn test_colliding_keys_fail_the_format() {
        let g = graph(
            r#"{"provider": "aws", "resources": [
                {"type": "instance", "name": "web",
                 "properties": {"instanceType": "t3.micro", "instance_type": "t3.large"}}
            ]}"#,
        );
        let tables = MappingTables::builtin().unwrap();
        for format in IacFormat::all() {
            let err = EmissionPlan::build(&g, &tables, format, &[]).unwrap_err();
            assert!(
                matches!(&err, CodegenError::Emission { message, .. }
                    if message.contains("'instanceType' and 'instance_type'")),
                "{format}: {err}"
            );
        }
    }

    #[test]
    fn test_colliding_nested_keys() {
        let g = graph(
            r#"{"provider": "aws", "resources": [
                {"type": "security-group", "name": "sg",
                 "properties": {"ingress": [{"fromPort": 80, "from_port": 443}]}},
                {"type": "exotic-service", "name": "thing",
                 "properties": {"fromPort": 1, "from_port": 2}}
            ]}"#,
        );
        let tables = MappingTables::builtin().unwrap();
        let err = EmissionPlan::build(&g, &tables, IacFormat::PulumiTypescript, &[]).unwrap_err();
        assert!(err.to_string().contains("resource 'sg'"));

        // Opaque maps keep distinct keys; unmapped bags are verbatim.
        let g = graph(
            r#"{"provider": "aws", "resources": [
                {"type": "bucket", "name": "b", "properties": {"tags": {"cost-center": "a", "cost_center": "b"}}},
                {"type": "exotic-service", "name": "thing", "properties": {"fromPort": 1, "from_port": 2}}
            ]}"#,
        );
        for format in IacFormat::all() {
            assert!(EmissionPlan::build(&g, &tables, format, &[]).is_ok(), "{format}");
        }
    }

    #[test]
    fn test_reserved_identifiers() {
        let g = graph(
            r#"{"provider": "aws", "resources": [{"type": "bucket", "name": "pulumi", "properties": {}}]}"#,
        );
        let tables = MappingTables::builtin().unwrap();
        let plan = EmissionPlan::build(&g, &tables, IacFormat::PulumiPython, &["pulumi"]).unwrap();
        assert_eq!(plan.entry(0).ident, "pulumi_2");
    }
}
