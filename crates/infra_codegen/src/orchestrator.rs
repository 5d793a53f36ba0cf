//! Runs the requested emitters over one graph.
//!
//! The graph is a shared prerequisite, so builder errors abort the whole
//! request. Emitter failures are scoped to their own format: the artifact is
//! dropped, a warning is recorded, and sibling formats are unaffected.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use infra_graph::{BuilderOptions, GraphBuilder, ResourceGraph};

use crate::cloudformation::CloudFormationEmitter;
use crate::emitter::{EmitOptions, Emission, Emitter};
use crate::error::{CodegenError, CodegenResult};
use crate::format::IacFormat;
use crate::mapping::MappingTables;
use crate::pulumi_python::PulumiPythonEmitter;
use crate::pulumi_typescript::PulumiTypescriptEmitter;
use crate::request::ConversionRequest;
use crate::terraform::TerraformEmitter;
use crate::warning::{GeneratedArtifact, GenerationReport, GenerationWarning};

/// Emitter registry plus the mapping tables they share.
pub struct Orchestrator {
    tables: Arc<MappingTables>,
    emitters: HashMap<IacFormat, Arc<dyn Emitter>>,
    builder_options: BuilderOptions,
}

impl Orchestrator {
    /// An orchestrator with the four built-in emitters.
    pub fn new(tables: MappingTables) -> Self {
        Self::with_emit_options(tables, EmitOptions::default())
    }

    pub fn with_emit_options(tables: MappingTables, options: EmitOptions) -> Self {
        let mut orchestrator = Self::empty(tables);
        orchestrator.register(Arc::new(TerraformEmitter::new(options.clone())));
        orchestrator.register(Arc::new(CloudFormationEmitter::new(options.clone())));
        orchestrator.register(Arc::new(PulumiPythonEmitter::new(options.clone())));
        orchestrator.register(Arc::new(PulumiTypescriptEmitter::new(options)));
        orchestrator
    }

    /// An orchestrator with no emitters registered.
    pub fn empty(tables: MappingTables) -> Self {
        Self {
            tables: Arc::new(tables),
            emitters: HashMap::new(),
            builder_options: BuilderOptions::default(),
        }
    }

    pub fn with_builder_options(mut self, options: BuilderOptions) -> Self {
        self.builder_options = options;
        self
    }

    /// Register an emitter under its format, replacing any existing one.
    pub fn register(&mut self, emitter: Arc<dyn Emitter>) {
        let format = emitter.format();
        debug!("Registering emitter: {}", format);
        self.emitters.insert(format, emitter);
    }

    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    /// Registered formats, sorted.
    pub fn formats(&self) -> Vec<IacFormat> {
        let mut formats: Vec<_> = self.emitters.keys().copied().collect();
        formats.sort();
        formats
    }

    /// Validate the request, build the graph, and run the emitters.
    pub fn convert(
        &self,
        document: &Value,
        request: &ConversionRequest,
    ) -> CodegenResult<GenerationReport> {
        let formats = request.validate()?;
        let graph = self.build_graph(document, request)?;
        Ok(self.generate(&graph, &formats))
    }

    /// [`convert`](Self::convert) with emitters on the blocking thread pool.
    pub async fn convert_concurrent(
        &self,
        document: &Value,
        request: &ConversionRequest,
    ) -> CodegenResult<GenerationReport> {
        let formats = request.validate()?;
        let graph = self.build_graph(document, request)?;
        Ok(self.generate_concurrent(Arc::new(graph), &formats).await)
    }

    fn build_graph(
        &self,
        document: &Value,
        request: &ConversionRequest,
    ) -> CodegenResult<ResourceGraph> {
        Ok(GraphBuilder::new(request.provider)
            .with_options(self.builder_options.clone())
            .build(document)?)
    }

    /// Run emitters one after another, in requested order.
    ///
    /// A panicking emitter is reported like a failing one.
    pub fn generate(&self, graph: &ResourceGraph, formats: &[IacFormat]) -> GenerationReport {
        let mut report = GenerationReport::default();
        for format in dedup(formats) {
            let result = match self.emitters.get(&format) {
                Some(emitter) => {
                    panic::catch_unwind(AssertUnwindSafe(|| emitter.emit(graph, &self.tables)))
                        .unwrap_or_else(|payload| Err(panicked(format, payload.as_ref())))
                }
                None => Err(not_registered(format)),
            };
            record(&mut report, format, result);
        }
        summarize(&report);
        report
    }

    /// Run every emitter on its own blocking task.
    ///
    /// Results are collected in requested order regardless of completion
    /// order. A panicking emitter is reported like a failing one.
    pub async fn generate_concurrent(
        &self,
        graph: Arc<ResourceGraph>,
        formats: &[IacFormat],
    ) -> GenerationReport {
        let handles: Vec<_> = dedup(formats)
            .into_iter()
            .map(|format| {
                let handle = self.emitters.get(&format).map(|emitter| {
                    let emitter = Arc::clone(emitter);
                    let graph = Arc::clone(&graph);
                    let tables = Arc::clone(&self.tables);
                    tokio::task::spawn_blocking(move || emitter.emit(&graph, &tables))
                });
                (format, handle)
            })
            .collect();

        let mut report = GenerationReport::default();
        for (format, handle) in handles {
            let result = match handle {
                Some(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => Err(panicked(format, e.into_panic().as_ref())),
                    Err(e) => Err(CodegenError::emission(format, format!("emitter task failed: {e}"))),
                },
                None => Err(not_registered(format)),
            };
            record(&mut report, format, result);
        }
        summarize(&report);
        report
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("emitters", &self.formats())
            .field("builder_options", &self.builder_options)
            .finish()
    }
}

fn dedup(formats: &[IacFormat]) -> Vec<IacFormat> {
    let mut unique = Vec::with_capacity(formats.len());
    for &format in formats {
        if !unique.contains(&format) {
            unique.push(format);
        }
    }
    unique
}

fn not_registered(format: IacFormat) -> CodegenError {
    CodegenError::emission(format, "no emitter registered")
}

fn panicked(format: IacFormat, payload: &(dyn Any + Send)) -> CodegenError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    CodegenError::emission(format, format!("emitter panicked: {detail}"))
}

fn record(report: &mut GenerationReport, format: IacFormat, result: CodegenResult<Emission>) {
    match result {
        Ok(emission) => {
            for unmapped in emission.unmapped {
                let warning = GenerationWarning::UnmappedResource {
                    resource: unmapped.resource,
                    resource_type: unmapped.resource_type,
                    format,
                };
                warn!("{}", warning);
                report.warnings.push(warning);
            }
            report.artifacts.push(GeneratedArtifact {
                format,
                code: emission.code,
                filename: format.filename().to_string(),
                resource_names: emission.resource_names,
            });
        }
        Err(e) => {
            let warning = GenerationWarning::EmissionFailed {
                format,
                message: e.to_string(),
            };
            warn!("{}", warning);
            report.warnings.push(warning);
        }
    }
}

fn summarize(report: &GenerationReport) {
    info!(
        "Generated {} artifact(s) with {} warning(s)",
        report.artifacts.len(),
        report.warnings.len()
    );
}
