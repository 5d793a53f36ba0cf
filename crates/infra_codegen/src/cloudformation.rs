//! CloudFormation (JSON) emitter.

use serde_json::{json, Map, Value};
use tracing::debug;

use infra_graph::ResourceGraph;

use crate::emitter::{EmitOptions, Emission, Emitter};
use crate::error::{CodegenError, CodegenResult};
use crate::format::IacFormat;
use crate::mapping::{normalize_type, MappingTables};
use crate::naming::to_pascal_case;
use crate::plan::{EmissionPlan, PlanProperty, PlanValue, PlannedResource};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Template parameter every `Custom::` fallback takes its `ServiceToken` from.
pub const SERVICE_TOKEN_PARAMETER: &str = "CustomResourceServiceToken";

/// Emits a single `template.json`.
#[derive(Debug, Clone, Default)]
pub struct CloudFormationEmitter {
    options: EmitOptions,
}

impl CloudFormationEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    /// Build the template as a JSON value.
    pub fn template(&self, plan: &EmissionPlan<'_>, tables: &MappingTables) -> Value {
        let mut template = Map::new();
        template.insert(
            "AWSTemplateFormatVersion".to_string(),
            Value::String(TEMPLATE_FORMAT_VERSION.to_string()),
        );

        let header = self.options.header_lines(plan);
        if !header.is_empty() {
            template.insert("Description".to_string(), Value::String(header.join(". ")));
        }

        if plan.unmapped().next().is_some() {
            template.insert(
                "Parameters".to_string(),
                json!({
                    SERVICE_TOKEN_PARAMETER: {
                        "Type": "String",
                        "Description": "ARN of the Lambda function or SNS topic backing custom resources"
                    }
                }),
            );
        }

        let mut resources = Map::new();
        for entry in &plan.entries {
            resources.insert(entry.ident.clone(), resource(plan, tables, entry));
        }
        template.insert("Resources".to_string(), Value::Object(resources));

        Value::Object(template)
    }
}

impl Emitter for CloudFormationEmitter {
    fn format(&self) -> IacFormat {
        IacFormat::CloudFormation
    }

    fn emit(&self, graph: &ResourceGraph, tables: &MappingTables) -> CodegenResult<Emission> {
        let plan = EmissionPlan::build(
            graph,
            tables,
            IacFormat::CloudFormation,
            &[SERVICE_TOKEN_PARAMETER],
        )?;
        let template = self.template(&plan, tables);
        let mut code = serde_json::to_string_pretty(&template)
            .map_err(|e| CodegenError::emission(IacFormat::CloudFormation, e.to_string()))?;
        code.push('\n');
        debug!("Rendered {} CloudFormation resources", plan.entries.len());
        Ok(Emission::from_plan(&plan, code))
    }
}

fn resource(plan: &EmissionPlan<'_>, tables: &MappingTables, entry: &PlannedResource<'_>) -> Value {
    let mut out = Map::new();
    let resource_type = match &entry.mapping {
        Some(mapping) => mapping.target.to_string(),
        None => custom_type(&entry.resource.resource_type),
    };
    out.insert("Type".to_string(), Value::String(resource_type));

    if !entry.dependencies.is_empty() {
        let deps = entry
            .dependencies
            .iter()
            .map(|&i| Value::String(plan.entry(i).ident.clone()))
            .collect();
        out.insert("DependsOn".to_string(), Value::Array(deps));
    }

    out.insert(
        "Metadata".to_string(),
        json!({
            "SourceName": entry.resource.name,
            "SourceType": entry.resource.resource_type,
        }),
    );

    let needs_token =
        !entry.is_mapped() && !entry.properties.iter().any(|p| p.key == "ServiceToken");
    if needs_token || !entry.properties.is_empty() {
        let mut properties = Map::new();
        if needs_token {
            properties.insert(
                "ServiceToken".to_string(),
                json!({ "Ref": SERVICE_TOKEN_PARAMETER }),
            );
        }
        for prop in &entry.properties {
            let value = if entry.is_mapped() && is_tag_map(tables, prop) {
                tag_list(plan, &prop.value)
            } else {
                to_json(plan, &prop.value)
            };
            properties.insert(prop.key.clone(), value);
        }
        out.insert("Properties".to_string(), Value::Object(properties));
    }

    Value::Object(out)
}

/// Resource type used for types without a mapping.
pub fn custom_type(resource_type: &str) -> String {
    let name = to_pascal_case(resource_type);
    if name.is_empty() {
        "Custom::Resource".to_string()
    } else {
        format!("Custom::{name}")
    }
}

fn is_tag_map(tables: &MappingTables, prop: &PlanProperty) -> bool {
    normalize_type(&prop.source_key) == "tags"
        && tables.is_opaque(&prop.source_key)
        && matches!(prop.value, PlanValue::Map(_))
}

/// `{"Name": "web"}` becomes `[{"Key": "Name", "Value": "web"}]`.
fn tag_list(plan: &EmissionPlan<'_>, value: &PlanValue) -> Value {
    let PlanValue::Map(tags) = value else {
        return to_json(plan, value);
    };
    Value::Array(
        tags.iter()
            .map(|tag| json!({ "Key": tag.key, "Value": to_json(plan, &tag.value) }))
            .collect(),
    )
}

fn to_json(plan: &EmissionPlan<'_>, value: &PlanValue) -> Value {
    match value {
        PlanValue::String(s) => Value::String(s.clone()),
        PlanValue::Number(n) => Value::Number(n.clone()),
        PlanValue::Bool(b) => Value::Bool(*b),
        PlanValue::Reference(idx) => json!({ "Ref": plan.entry(*idx).ident }),
        PlanValue::List(items) => Value::Array(items.iter().map(|v| to_json(plan, v)).collect()),
        PlanValue::Map(props) => Value::Object(
            props
                .iter()
                .map(|p| (p.key.clone(), to_json(plan, &p.value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_graph::{CloudProvider, DocumentReader, GraphBuilder};

    fn emit(json: &str) -> Emission {
        let doc = DocumentReader::from_json_str(json).unwrap();
        let graph = GraphBuilder::new(CloudProvider::Aws).build(&doc).unwrap();
        let tables = MappingTables::builtin().unwrap();
        CloudFormationEmitter::default().emit(&graph, &tables).unwrap()
    }

    #[test]
    fn test_template_structure() {
        let emission = emit(
            r#"{"provider": "aws", "security": {"encryption": true}, "resources": [
                {"type": "instance", "name": "web-instance", "dependencies": ["web-sg"], "properties": {
                    "instance_type": "t3.micro",
                    "vpc_security_group_ids": ["web-sg"],
                    "tags": {"Name": "web"}
                }},
                {"type": "security-group", "name": "web-sg", "properties": {"description": "Web tier"}}
            ]}"#,
        );
        let template: Value = serde_json::from_str(&emission.code).unwrap();

        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
        assert!(template["Description"]
            .as_str()
            .unwrap()
            .contains("encryption=enabled"));

        let keys: Vec<_> = template["Resources"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["WebSg", "WebInstance"]);

        let sg = &template["Resources"]["WebSg"];
        assert_eq!(sg["Type"], "AWS::EC2::SecurityGroup");
        assert_eq!(sg["Properties"]["GroupDescription"], "Web tier");
        assert_eq!(sg["Metadata"]["SourceName"], "web-sg");

        let instance = &template["Resources"]["WebInstance"];
        assert_eq!(instance["DependsOn"], json!(["WebSg"]));
        assert_eq!(instance["Properties"]["SecurityGroupIds"], json!([{"Ref": "WebSg"}]));
        assert_eq!(instance["Properties"]["Tags"], json!([{"Key": "Name", "Value": "web"}]));

        let field_order: Vec<_> = instance.as_object().unwrap().keys().cloned().collect();
        assert_eq!(field_order, vec!["Type", "DependsOn", "Metadata", "Properties"]);
        assert!(emission.code.ends_with("}\n"));
    }

    #[test]
    fn test_unmapped_resource_is_custom() {
        let emission = emit(
            r#"{"provider": "aws", "resources": [
                {"type": "exotic-service", "name": "thing", "properties": {"some_key": "v", "tags": {"a": "b"}}}
            ]}"#,
        );
        let template: Value = serde_json::from_str(&emission.code).unwrap();
        let thing = &template["Resources"]["Thing"];
        assert_eq!(thing["Type"], "Custom::ExoticService");
        assert_eq!(
            thing["Properties"],
            json!({
                "ServiceToken": {"Ref": "CustomResourceServiceToken"},
                "some_key": "v",
                "tags": {"a": "b"}
            })
        );
        assert_eq!(
            template["Parameters"]["CustomResourceServiceToken"]["Type"],
            "String"
        );
        assert_eq!(emission.unmapped[0].resource, "thing");
    }

    #[test]
    fn test_service_token_parameter_is_reserved() {
        let emission = emit(
            r#"{"provider": "aws", "resources": [
                {"type": "exotic-service", "name": "custom-resource-service-token", "properties": {}},
                {"type": "other-service", "name": "other", "properties": {"ServiceToken": "arn:aws:lambda:x"}}
            ]}"#,
        );
        let template: Value = serde_json::from_str(&emission.code).unwrap();
        let resources = template["Resources"].as_object().unwrap();
        assert!(resources.contains_key("CustomResourceServiceToken2"));
        assert_eq!(
            resources["CustomResourceServiceToken2"]["Properties"],
            json!({"ServiceToken": {"Ref": "CustomResourceServiceToken"}})
        );
        assert_eq!(
            resources["Other"]["Properties"],
            json!({"ServiceToken": "arn:aws:lambda:x"})
        );
    }

    #[test]
    fn test_empty_graph() {
        let emission = emit(r#"{"provider": "aws", "resources": []}"#);
        let template: Value = serde_json::from_str(&emission.code).unwrap();
        assert_eq!(template["Resources"], json!({}));
        assert!(template.get("Parameters").is_none());
        assert!(emission.unmapped.is_empty());
    }
}
