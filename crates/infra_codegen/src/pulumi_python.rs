//! Pulumi Python emitter.

use std::collections::BTreeSet;

use tracing::debug;

use infra_graph::ResourceGraph;

use crate::emitter::{EmitOptions, Emission, Emitter};
use crate::error::{CodegenError, CodegenResult};
use crate::format::IacFormat;
use crate::mapping::MappingTables;
use crate::naming::{python_keyword_argument, to_pascal_case};
use crate::plan::{EmissionPlan, PlanProperty, PlanValue, PlannedResource};

const INDENT: &str = "    ";
const INLINE_LIST_WIDTH: usize = 72;

/// Emits a single `__main__.py` program.
#[derive(Debug, Clone, Default)]
pub struct PulumiPythonEmitter {
    options: EmitOptions,
}

impl PulumiPythonEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    fn render(&self, plan: &EmissionPlan<'_>, tables: &MappingTables) -> CodegenResult<String> {
        let mut out = String::new();
        for line in self.options.header_lines(plan) {
            out.push_str(&format!("# {}\n", comment_text(&line)));
        }
        if !out.is_empty() {
            out.push('\n');
        }

        out.push_str("import pulumi\n");
        for alias in used_namespaces(plan) {
            let namespace = tables.namespace(alias).ok_or_else(|| {
                CodegenError::emission(
                    IacFormat::PulumiPython,
                    format!("unknown Pulumi namespace '{alias}'"),
                )
            })?;
            out.push_str(&format!("import {} as {alias}\n", namespace.python_module));
        }

        let writer = PythonWriter { plan };
        for entry in &plan.entries {
            out.push('\n');
            out.push_str(&writer.statement(entry));
        }
        Ok(out)
    }
}

impl Emitter for PulumiPythonEmitter {
    fn format(&self) -> IacFormat {
        IacFormat::PulumiPython
    }

    fn emit(&self, graph: &ResourceGraph, tables: &MappingTables) -> CodegenResult<Emission> {
        let mut reserved = vec!["pulumi"];
        reserved.extend(tables.namespace_aliases());
        let plan = EmissionPlan::build(graph, tables, IacFormat::PulumiPython, &reserved)?;
        let code = self.render(&plan, tables)?;
        debug!("Rendered {} Pulumi Python resources", plan.entries.len());
        Ok(Emission::from_plan(&plan, code))
    }
}

/// Namespace aliases referenced by mapped class paths, sorted.
pub(crate) fn used_namespaces<'p>(plan: &'p EmissionPlan<'_>) -> BTreeSet<&'p str> {
    plan.entries
        .iter()
        .filter_map(|e| e.mapping.as_ref())
        .filter_map(|m| m.target.split('.').next())
        .collect()
}

/// Type token for the component standing in for an unmapped resource.
pub(crate) fn unmanaged_token(resource_type: &str) -> String {
    let name = to_pascal_case(resource_type);
    let name = if name.is_empty() { "Resource".to_string() } else { name };
    format!("unmanaged:index:{name}")
}

struct PythonWriter<'p> {
    plan: &'p EmissionPlan<'p>,
}

impl PythonWriter<'_> {
    fn statement(&self, entry: &PlannedResource<'_>) -> String {
        let mut out = format!(
            "# {} \"{}\"{}\n",
            comment_text(&entry.resource.resource_type),
            comment_text(entry.name()),
            if entry.is_mapped() { "" } else { " (unmapped)" }
        );

        let mut args = Vec::new();
        let constructor = match &entry.mapping {
            Some(mapping) => {
                args.push(quote(entry.name()));
                for prop in &entry.properties {
                    args.push(format!(
                        "{}={}",
                        python_keyword_argument(&prop.key),
                        self.expr(&prop.value, 1)
                    ));
                }
                mapping.target.to_string()
            }
            None => {
                args.push(quote(&unmanaged_token(&entry.resource.resource_type)));
                args.push(quote(entry.name()));
                let props = vec![
                    PlanProperty {
                        source_key: "type".to_string(),
                        key: "type".to_string(),
                        value: PlanValue::String(entry.resource.resource_type.clone()),
                    },
                    PlanProperty {
                        source_key: "properties".to_string(),
                        key: "properties".to_string(),
                        value: PlanValue::Map(entry.properties.clone()),
                    },
                ];
                args.push(format!("props={}", self.dict(&props, 1)));
                "pulumi.ComponentResource".to_string()
            }
        };

        if !entry.dependencies.is_empty() {
            let deps: Vec<&str> = entry
                .dependencies
                .iter()
                .map(|&i| self.plan.entry(i).ident.as_str())
                .collect();
            args.push(format!(
                "opts=pulumi.ResourceOptions(depends_on=[{}])",
                deps.join(", ")
            ));
        }

        out.push_str(&format!("{} = {constructor}(\n", entry.ident));
        for arg in args {
            out.push_str(&format!("{INDENT}{arg},\n"));
        }
        out.push_str(")\n");
        out
    }

    fn expr(&self, value: &PlanValue, depth: usize) -> String {
        match value {
            PlanValue::String(s) => quote(s),
            PlanValue::Number(n) => n.to_string(),
            PlanValue::Bool(true) => "True".to_string(),
            PlanValue::Bool(false) => "False".to_string(),
            PlanValue::Reference(idx) => {
                let target = self.plan.entry(*idx);
                if target.is_mapped() {
                    format!("{}.id", target.ident)
                } else {
                    format!("{}.urn", target.ident)
                }
            }
            PlanValue::List(items) => self.list(items, depth),
            PlanValue::Map(props) => self.dict(props, depth),
        }
    }

    fn list(&self, items: &[PlanValue], depth: usize) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }
        if items.iter().all(PlanValue::is_scalar) {
            let parts: Vec<String> = items.iter().map(|v| self.expr(v, depth)).collect();
            let inline = format!("[{}]", parts.join(", "));
            if inline.len() <= INLINE_LIST_WIDTH {
                return inline;
            }
        }
        let pad = INDENT.repeat(depth + 1);
        let mut out = String::from("[\n");
        for item in items {
            out.push_str(&format!("{pad}{},\n", self.expr(item, depth + 1)));
        }
        out.push_str(&INDENT.repeat(depth));
        out.push(']');
        out
    }

    fn dict(&self, props: &[PlanProperty], depth: usize) -> String {
        if props.is_empty() {
            return "{}".to_string();
        }
        let pad = INDENT.repeat(depth + 1);
        let mut out = String::from("{\n");
        for prop in props {
            out.push_str(&format!(
                "{pad}{}: {},\n",
                quote(&prop.key),
                self.expr(&prop.value, depth + 1)
            ));
        }
        out.push_str(&INDENT.repeat(depth));
        out.push('}');
        out
    }
}

/// Double-quoted Python string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x100 && c.is_control() => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn comment_text(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_graph::{CloudProvider, DocumentReader, GraphBuilder};

    fn emit(json: &str) -> CodegenResult<Emission> {
        let doc = DocumentReader::from_json_str(json).unwrap();
        let graph = GraphBuilder::new(CloudProvider::Aws).build(&doc).unwrap();
        let tables = MappingTables::builtin().unwrap();
        PulumiPythonEmitter::default().emit(&graph, &tables)
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("it's \"x\"\n"), r#""it's \"x\"\n""#);
        assert_eq!(quote("a\u{7}"), r#""a\x07""#);
    }

    #[test]
    fn test_statements_and_references() {
        let emission = emit(
            r#"{"provider": "aws", "resources": [
                {"type": "security-group", "name": "web-sg", "properties": {
                    "description": "Web tier",
                    "ingress": [{"protocol": "tcp", "fromPort": 443}]
                }},
                {"type": "lambda", "name": "handler", "dependencies": ["web-sg"], "properties": {
                    "lambda": "web-sg",
                    "enabled": true
                }}
            ]}"#,
        )
        .unwrap();

        let code = &emission.code;
        assert!(code.contains("import pulumi\nimport pulumi_aws as aws\n"));
        assert!(code.contains(
            "web_sg = aws.ec2.SecurityGroup(\n    \"web-sg\",\n    description=\"Web tier\",\n    ingress=[\n        {\n            \"protocol\": \"tcp\",\n            \"from_port\": 443,\n        },\n    ],\n)\n"
        ));
        assert!(code.contains("handler = aws.lambda_.Function(\n"));
        assert!(code.contains("    lambda_=web_sg.id,\n    enabled=True,\n"));
        assert!(code.contains("    opts=pulumi.ResourceOptions(depends_on=[web_sg]),\n)\n"));
    }

    #[test]
    fn test_unmapped_component() {
        let emission = emit(
            r#"{"provider": "aws", "resources": [
                {"type": "exotic-service", "name": "thing", "properties": {"someKey": "v"}}
            ]}"#,
        )
        .unwrap();
        assert!(emission.code.contains(
            "thing = pulumi.ComponentResource(\n    \"unmanaged:index:ExoticService\",\n    \"thing\",\n    props={\n        \"type\": \"exotic-service\",\n        \"properties\": {\n            \"someKey\": \"v\",\n        },\n    },\n)\n"
        ));
        assert!(!emission.code.contains("import pulumi_aws"));
        assert_eq!(emission.unmapped.len(), 1);
    }

    #[test]
    fn test_reserved_names_are_suffixed() {
        let emission = emit(
            r#"{"provider": "aws", "resources": [
                {"type": "bucket", "name": "aws", "properties": {}},
                {"type": "bucket", "name": "class", "properties": {}}
            ]}"#,
        )
        .unwrap();
        assert!(emission.code.contains("aws_2 = aws.s3.Bucket(\n    \"aws\",\n)\n"));
        assert!(emission.code.contains("class_ = aws.s3.Bucket(\n"));
    }
}
