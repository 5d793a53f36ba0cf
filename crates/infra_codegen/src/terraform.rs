//! Terraform (HCL) emitter.

use std::collections::BTreeSet;

use tracing::debug;

use infra_graph::{CloudProvider, ResourceGraph};

use crate::emitter::{EmitOptions, Emission, Emitter};
use crate::error::CodegenResult;
use crate::format::IacFormat;
use crate::mapping::MappingTables;
use crate::naming::{attribute_key, is_identifier};
use crate::plan::{EmissionPlan, PlanProperty, PlanValue, PlannedResource};

const INDENT: &str = "  ";
const INLINE_LIST_WIDTH: usize = 80;

/// Built-in resource type used for types without a mapping.
pub const FALLBACK_RESOURCE: &str = "terraform_data";

/// Emits a single `main.tf`.
#[derive(Debug, Clone, Default)]
pub struct TerraformEmitter {
    options: EmitOptions,
}

impl TerraformEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    fn render(&self, plan: &EmissionPlan<'_>, tables: &MappingTables) -> String {
        let mut out = String::new();

        for line in self.options.header_lines(plan) {
            out.push_str(&format!("# {}\n", comment_text(&line)));
        }
        if !out.is_empty() {
            out.push('\n');
        }

        out.push_str(&required_providers(plan, tables));
        out.push('\n');
        out.push_str(&provider_block(plan.provider, self.options.region_for(plan.provider)));

        let writer = HclWriter { plan };
        for entry in &plan.entries {
            out.push('\n');
            out.push_str(&writer.resource(entry));
        }

        out
    }
}

impl Emitter for TerraformEmitter {
    fn format(&self) -> IacFormat {
        IacFormat::Terraform
    }

    fn emit(&self, graph: &ResourceGraph, tables: &MappingTables) -> CodegenResult<Emission> {
        let plan = EmissionPlan::build(graph, tables, IacFormat::Terraform, &[])?;
        let code = self.render(&plan, tables);
        debug!("Rendered {} Terraform resources", plan.entries.len());
        Ok(Emission::from_plan(&plan, code))
    }
}

fn required_providers(plan: &EmissionPlan<'_>, tables: &MappingTables) -> String {
    let mut prefixes = BTreeSet::new();
    prefixes.insert(plan.provider.terraform_name().to_string());
    for entry in &plan.entries {
        if let Some(mapping) = &entry.mapping {
            if let Some(prefix) = mapping.target.split('_').next() {
                if tables.terraform_provider(prefix).is_some() {
                    prefixes.insert(prefix.to_string());
                }
            }
        }
    }

    let mut out = String::from("terraform {\n  required_providers {\n");
    for prefix in &prefixes {
        out.push_str(&format!("    {prefix} = {{\n"));
        match tables.terraform_provider(prefix) {
            Some(spec) => {
                out.push_str(&format!("      source  = {}\n", quote(&spec.source)));
                out.push_str(&format!("      version = {}\n", quote(&spec.version)));
            }
            None => {
                out.push_str(&format!("      source = {}\n", quote(&format!("hashicorp/{prefix}"))));
            }
        }
        out.push_str("    }\n");
    }
    out.push_str("  }\n}\n");
    out
}

fn provider_block(provider: CloudProvider, region: &str) -> String {
    match provider {
        CloudProvider::Azure => "provider \"azurerm\" {\n  features {}\n}\n".to_string(),
        CloudProvider::Aws | CloudProvider::Gcp => format!(
            "provider \"{}\" {{\n  region = {}\n}}\n",
            provider.terraform_name(),
            quote(region)
        ),
    }
}

struct HclWriter<'p> {
    plan: &'p EmissionPlan<'p>,
}

enum BodyItem<'v> {
    Attribute(String, String),
    Blocks(String, Vec<&'v [PlanProperty]>),
}

impl HclWriter<'_> {
    fn resource(&self, entry: &PlannedResource<'_>) -> String {
        let resource_type = address_type(entry);
        let mut out = format!(
            "# {} \"{}\"{}\n",
            comment_text(&entry.resource.resource_type),
            comment_text(entry.name()),
            if entry.is_mapped() { "" } else { " (unmapped)" }
        );
        out.push_str(&format!("resource \"{resource_type}\" \"{}\" {{\n", entry.ident));

        let mut body = String::new();
        if entry.is_mapped() {
            self.body(&entry.properties, 1, &mut body);
        } else {
            let input = vec![
                ("type".to_string(), quote(&entry.resource.resource_type)),
                ("properties".to_string(), self.object(&entry.properties, 2)),
            ];
            let input = format!("{{\n{}{INDENT}}}", aligned(&input, &INDENT.repeat(2)));
            body.push_str(&format!("{INDENT}input = {input}\n"));
        }

        if !entry.dependencies.is_empty() {
            if !body.is_empty() {
                body.push('\n');
            }
            let deps: Vec<String> = entry
                .dependencies
                .iter()
                .map(|&i| self.address(i))
                .collect();
            body.push_str(&format!("{INDENT}depends_on = [{}]\n", deps.join(", ")));
        }

        out.push_str(&body);
        out.push_str("}\n");
        out
    }

    fn address(&self, idx: usize) -> String {
        let target = self.plan.entry(idx);
        format!("{}.{}", address_type(target), target.ident)
    }

    fn body(&self, props: &[PlanProperty], depth: usize, out: &mut String) {
        let pad = INDENT.repeat(depth);
        let items: Vec<BodyItem<'_>> = props
            .iter()
            .map(|prop| {
                let name = attribute_name(&prop.key);
                match block_list(&prop.value) {
                    Some(blocks) => BodyItem::Blocks(name, blocks),
                    None => BodyItem::Attribute(name, self.expr(&prop.value, depth)),
                }
            })
            .collect();

        let mut run: Vec<(String, String)> = Vec::new();
        for item in items {
            match item {
                BodyItem::Attribute(name, value) => run.push((name, value)),
                BodyItem::Blocks(name, blocks) => {
                    out.push_str(&aligned(&run, &pad));
                    run.clear();
                    for block in blocks {
                        out.push_str(&format!("{pad}{name} {{\n"));
                        self.body(block, depth + 1, out);
                        out.push_str(&format!("{pad}}}\n"));
                    }
                }
            }
        }
        out.push_str(&aligned(&run, &pad));
    }

    /// Render an expression whose first line starts at `depth`.
    fn expr(&self, value: &PlanValue, depth: usize) -> String {
        match value {
            PlanValue::String(s) => quote(s),
            PlanValue::Number(n) => n.to_string(),
            PlanValue::Bool(b) => b.to_string(),
            PlanValue::Reference(idx) => format!("{}.id", self.address(*idx)),
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
        let entries: Vec<(String, String)> = props
            .iter()
            .map(|p| (object_key(&p.key), self.expr(&p.value, depth + 1)))
            .collect();
        format!(
            "{{\n{}{}}}",
            aligned(&entries, &INDENT.repeat(depth + 1)),
            INDENT.repeat(depth)
        )
    }
}

fn address_type<'e>(entry: &'e PlannedResource<'_>) -> &'e str {
    entry.mapping.as_ref().map_or(FALLBACK_RESOURCE, |m| m.target)
}

/// A non-empty list of maps renders as repeated nested blocks.
fn block_list(value: &PlanValue) -> Option<Vec<&[PlanProperty]>> {
    let PlanValue::List(items) = value else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| match item {
            PlanValue::Map(props) => Some(props.as_slice()),
            _ => None,
        })
        .collect()
}

/// `key = value` lines; consecutive single-line values share one `=` column.
fn aligned(entries: &[(String, String)], pad: &str) -> String {
    let mut out = String::new();
    let mut start = 0;
    while start < entries.len() {
        let mut end = start;
        while end < entries.len() && !entries[end].1.contains('\n') {
            end += 1;
        }
        let width = entries[start..end]
            .iter()
            .map(|(k, _)| k.len())
            .max()
            .unwrap_or(0);
        for (key, value) in &entries[start..end] {
            out.push_str(&format!("{pad}{key:<width$} = {value}\n"));
        }
        if end < entries.len() {
            let (key, value) = &entries[end];
            out.push_str(&format!("{pad}{key} = {value}\n"));
            end += 1;
        }
        start = end;
    }
    out
}

fn attribute_name(key: &str) -> String {
    attribute_key(IacFormat::Terraform, key)
}

fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Quote an HCL string literal, escaping template sequences.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
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
