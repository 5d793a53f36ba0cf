//! # infra_codegen
//!
//! Multi-target code generation for infragen.
//!
//! One validated [`ResourceGraph`](infra_graph::ResourceGraph) goes in; one
//! artifact per requested [`IacFormat`] comes out:
//!
//! - **Terraform**: HCL, `main.tf`
//! - **CloudFormation**: JSON, `template.json` (AWS only)
//! - **Pulumi Python**: `__main__.py`
//! - **Pulumi TypeScript**: `index.ts`
//!
//! Every emitter renders resources in the same stable topological order, so
//! dependencies are declared before their dependents in all four outputs.
//! Types without a mapping are kept as a generic construct and reported as
//! warnings; a failing emitter only loses its own artifact.
//!
//! ## Example
//!
//! ```rust
//! use infra_codegen::{ConversionRequest, IacFormat, MappingTables, Orchestrator};
//! use infra_graph::CloudProvider;
//!
//! let document = serde_json::json!({
//!     "provider": "aws",
//!     "resources": [
//!         {"type": "security-group", "name": "web-sg", "properties": {}},
//!         {"type": "instance", "name": "web-instance", "properties": {}, "dependencies": ["web-sg"]}
//!     ]
//! });
//!
//! let orchestrator = Orchestrator::new(MappingTables::builtin().unwrap());
//! let request = ConversionRequest::new(CloudProvider::Aws, [IacFormat::Terraform]);
//! let report = orchestrator.convert(&document, &request).unwrap();
//!
//! assert_eq!(report.artifacts[0].filename, "main.tf");
//! assert_eq!(report.artifacts[0].resource_names, ["web-sg", "web-instance"]);
//! ```

pub mod cloudformation;
pub mod emitter;
pub mod error;
pub mod format;
pub mod mapping;
pub mod naming;
pub mod orchestrator;
pub mod plan;
pub mod pulumi_python;
pub mod pulumi_typescript;
pub mod request;
pub mod terraform;
pub mod warning;

pub use cloudformation::CloudFormationEmitter;
pub use emitter::{EmitOptions, Emission, Emitter, UnmappedResource};
pub use error::{CodegenError, CodegenResult};
pub use format::IacFormat;
pub use mapping::{MappingDocument, MappingTables};
pub use orchestrator::Orchestrator;
pub use pulumi_python::PulumiPythonEmitter;
pub use pulumi_typescript::PulumiTypescriptEmitter;
pub use request::ConversionRequest;
pub use terraform::TerraformEmitter;
pub use warning::{GeneratedArtifact, GenerationReport, GenerationWarning};
