//! Pulumi TypeScript emitter.

use tracing::debug;

use infra_graph::ResourceGraph;

use crate::emitter::{EmitOptions, Emission, Emitter};
use crate::error::{CodegenError, CodegenResult};
use crate::format::IacFormat;
use crate::mapping::MappingTables;
use crate::plan::{EmissionPlan, PlanProperty, PlanValue, PlannedResource};
use crate::pulumi_python::{unmanaged_token, used_namespaces};

const INDENT: &str = "    ";
const INLINE_LIST_WIDTH: usize = 72;

/// Emits a single `index.ts` program.
#[derive(Debug, Clone, Default)]
pub struct PulumiTypescriptEmitter {
    options: EmitOptions,
}

impl PulumiTypescriptEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    fn render(&self, plan: &EmissionPlan<'_>, tables: &MappingTables) -> CodegenResult<String> {
        let mut out = String::new();
        for line in self.options.header_lines(plan) {
            out.push_str(&format!("// {}\n", comment_text(&line)));
        }
        if !out.is_empty() {
            out.push('\n');
        }

        out.push_str("import * as pulumi from \"@pulumi/pulumi\";\n");
        for alias in used_namespaces(plan) {
            let namespace = tables.namespace(alias).ok_or_else(|| {
                CodegenError::emission(
                    IacFormat::PulumiTypescript,
                    format!("unknown Pulumi namespace '{alias}'"),
                )
            })?;
            out.push_str(&format!(
                "import * as {alias} from {};\n",
                quote(&namespace.typescript_package)
            ));
        }

        let writer = TypescriptWriter { plan };
        for entry in &plan.entries {
            out.push('\n');
            out.push_str(&writer.statement(entry));
        }
        Ok(out)
    }
}

impl Emitter for PulumiTypescriptEmitter {
    fn format(&self) -> IacFormat {
        IacFormat::PulumiTypescript
    }

    fn emit(&self, graph: &ResourceGraph, tables: &MappingTables) -> CodegenResult<Emission> {
        let mut reserved = vec!["pulumi"];
        reserved.extend(tables.namespace_aliases());
        let plan = EmissionPlan::build(graph, tables, IacFormat::PulumiTypescript, &reserved)?;
        let code = self.render(&plan, tables)?;
        debug!("Rendered {} Pulumi TypeScript resources", plan.entries.len());
        Ok(Emission::from_plan(&plan, code))
    }
}

struct TypescriptWriter<'p> {
    plan: &'p EmissionPlan<'p>,
}

impl TypescriptWriter<'_> {
    fn statement(&self, entry: &PlannedResource<'_>) -> String {
        let mut out = format!(
            "// {} \"{}\"{}\n",
            comment_text(&entry.resource.resource_type),
            comment_text(entry.name()),
            if entry.is_mapped() { "" } else { " (unmapped)" }
        );

        let (constructor, mut args) = match &entry.mapping {
            Some(mapping) => (
                mapping.target.to_string(),
                vec![quote(entry.name()), self.object(&entry.properties, 0)],
            ),
            None => {
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
                (
                    "pulumi.ComponentResource".to_string(),
                    vec![
                        quote(&unmanaged_token(&entry.resource.resource_type)),
                        quote(entry.name()),
                        self.object(&props, 0),
                    ],
                )
            }
        };

        if !entry.dependencies.is_empty() {
            let deps: Vec<&str> = entry
                .dependencies
                .iter()
                .map(|&i| self.plan.entry(i).ident.as_str())
                .collect();
            args.push(format!("{{ dependsOn: [{}] }}", deps.join(", ")));
        }

        out.push_str(&format!(
            "const {} = new {constructor}({});\n",
            entry.ident,
            args.join(", ")
        ));
        out
    }

    fn expr(&self, value: &PlanValue, depth: usize) -> String {
        match value {
            PlanValue::String(s) => quote(s),
            PlanValue::Number(n) => n.to_string(),
            PlanValue::Bool(b) => b.to_string(),
            PlanValue::Reference(idx) => {
                let target = self.plan.entry(*idx);
                if target.is_mapped() {
                    format!("{}.id", target.ident)
                } else {
                    format!("{}.urn", target.ident)
                }
            }
            PlanValue::List(items) => self.list(items, depth),
            PlanValue::Map(props) => self.object(props, depth),
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

    fn object(&self, props: &[PlanProperty], depth: usize) -> String {
        if props.is_empty() {
            return "{}".to_string();
        }
        let pad = INDENT.repeat(depth + 1);
        let mut out = String::from("{\n");
        for prop in props {
            out.push_str(&format!(
                "{pad}{}: {},\n",
                property_name(&prop.key),
                self.expr(&prop.value, depth + 1)
            ));
        }
        out.push_str(&INDENT.repeat(depth));
        out.push('}');
        out
    }
}

fn property_name(key: &str) -> String {
    let mut chars = key.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Double-quoted TypeScript string literal.
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
            '\u{2028}' | '\u{2029}' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn comment_text(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{2028}' | '\u{2029}' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_graph::{CloudProvider, DocumentReader, GraphBuilder};

    fn emit(json: &str, provider: CloudProvider) -> Emission {
        let doc = DocumentReader::from_json_str(json).unwrap();
        let graph = GraphBuilder::new(provider).build(&doc).unwrap();
        let tables = MappingTables::builtin().unwrap();
        PulumiTypescriptEmitter::default().emit(&graph, &tables).unwrap()
    }

    #[test]
    fn test_property_names() {
        assert_eq!(property_name("instanceType"), "instanceType");
        assert_eq!(property_name("cost-center"), "\"cost-center\"");
        assert_eq!(quote("a\u{2028}b"), r#""a\u2028b""#);
    }

    #[test]
    fn test_statements_and_imports() {
        let emission = emit(
            r#"{"provider": "azure", "resources": [
                {"type": "resource-group", "name": "rg", "properties": {"location": "westeurope"}},
                {"type": "vnet", "name": "main-net", "dependencies": ["rg"], "properties": {
                    "resource_group_name": "rg",
                    "cidr_block": ["10.0.0.0/16"],
                    "tags": {"cost-center": "ops"}
                }},
                {"type": "random-password", "name": "db-pass", "properties": {}}
            ]}"#,
            CloudProvider::Azure,
        );

        let code = &emission.code;
        assert!(code.contains(
            "import * as pulumi from \"@pulumi/pulumi\";\nimport * as azure_native from \"@pulumi/azure-native\";\nimport * as random from \"@pulumi/random\";\n"
        ));
        assert!(code.contains(
            "const rg = new azure_native.resources.ResourceGroup(\"rg\", {\n    location: \"westeurope\",\n});\n"
        ));
        assert!(code.contains(
            "const mainNet = new azure_native.network.VirtualNetwork(\"main-net\", {\n    resourceGroupName: rg.id,\n    addressSpace: [\"10.0.0.0/16\"],\n    tags: {\n        \"cost-center\": \"ops\",\n    },\n}, { dependsOn: [rg] });\n"
        ));
        assert!(code.contains("const dbPass = new random.RandomPassword(\"db-pass\", {});\n"));
        assert_eq!(emission.resource_names, vec!["rg", "main-net", "db-pass"]);
    }

    #[test]
    fn test_unmapped_component_reference_uses_urn() {
        let emission = emit(
            r#"{"provider": "aws", "resources": [
                {"type": "exotic-service", "name": "thing", "properties": {}},
                {"type": "bucket", "name": "logs", "dependencies": ["thing"], "properties": {"owner": "thing"}}
            ]}"#,
            CloudProvider::Aws,
        );
        assert!(emission.code.contains(
            "const thing = new pulumi.ComponentResource(\"unmanaged:index:ExoticService\", \"thing\", {\n    type: \"exotic-service\",\n    properties: {},\n});\n"
        ));
        assert!(emission.code.contains("    owner: thing.urn,\n}, { dependsOn: [thing] });\n"));
    }
}
