//! Conformance test helpers for the Weld build pipeline.
//!
//! Provides an in-memory package store, a counting test linker, and a
//! shared pipeline function that runs compilation units through the full
//! pipeline (batch → plugins → link) and returns structured results for
//! assertion in integration tests.

#![warn(missing_docs)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weld_build::{
    CodeResource, CompilationUnit, Export, PackageStore, PluginDriver, PluginPackage,
    RawResource, Resource, UnitKind,
};
use weld_common::Arch;
use weld_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use weld_link::{collect_resources, LinkCache, LinkError, LinkOptions, LinkedFile, Linker};

/// Result of running the full batch → plugins → link pipeline.
pub struct PipelineResult {
    /// Final output resources per unit, in input order.
    pub resources: Vec<Vec<Resource>>,
    /// All diagnostics emitted during the pipeline.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any errors were emitted.
    pub has_errors: bool,
    /// Number of error-severity diagnostics.
    pub error_count: usize,
}

/// An in-memory [`PackageStore`] for tests.
#[derive(Default)]
pub struct MemoryStore {
    plugin_packages: Vec<Arc<PluginPackage>>,
    exports: HashMap<String, Vec<Export>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin package; activation order is insertion order.
    pub fn with_plugin_package(mut self, package: PluginPackage) -> Self {
        self.plugin_packages.push(Arc::new(package));
        self
    }

    /// Records the exports of a package for every architecture.
    pub fn with_exports(mut self, package: &str, exports: Vec<Export>) -> Self {
        self.exports.insert(package.to_string(), exports);
        self
    }
}

impl PackageStore for MemoryStore {
    fn active_plugin_packages(&self, _unit: &CompilationUnit) -> Vec<Arc<PluginPackage>> {
        self.plugin_packages.clone()
    }

    fn exports_of(&self, package: &str, _arch: &Arch) -> Option<Vec<Export>> {
        self.exports.get(package).cloned()
    }
}

/// A [`Linker`] that concatenates its inputs into one combined file and
/// counts invocations, so tests can observe cache hits.
#[derive(Default)]
pub struct CountingLinker {
    calls: AtomicUsize,
}

impl CountingLinker {
    /// Creates a linker with a zeroed invocation counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `link` has run.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Linker for CountingLinker {
    fn link(
        &self,
        files: &[CodeResource],
        options: &LinkOptions,
    ) -> Result<Vec<LinkedFile>, LinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let serve_path = options
            .combined_serve_path
            .clone()
            .unwrap_or_else(|| "/app.js".to_string());
        let mut source = String::new();
        for file in files {
            let text =
                std::str::from_utf8(&file.data).map_err(|e| LinkError::new(e.to_string()))?;
            source.push_str(text);
            source.push('\n');
        }
        Ok(vec![LinkedFile {
            serve_path,
            source,
            source_map: None,
        }])
    }
}

/// Creates a package compilation unit on the given architecture.
pub fn package_unit(name: &str, arch: &str, resources: Vec<RawResource>) -> CompilationUnit {
    CompilationUnit {
        package: Some(name.to_string()),
        arch: Arch::new(arch),
        kind: UnitKind::Main,
        is_test: false,
        declared_exports: vec![],
        dependencies: vec![],
        resources,
    }
}

/// Creates an application compilation unit on the given architecture.
pub fn app_unit(arch: &str, resources: Vec<RawResource>) -> CompilationUnit {
    CompilationUnit {
        package: None,
        arch: Arch::new(arch),
        kind: UnitKind::Main,
        is_test: false,
        declared_exports: vec![],
        dependencies: vec![],
        resources,
    }
}

/// Runs the full pipeline for `units` on `arch` and collects per-unit
/// output resources.
pub fn run_pipeline(
    arch: &str,
    units: Vec<CompilationUnit>,
    store: &dyn PackageStore,
    linker: &dyn Linker,
    cache: &LinkCache,
) -> PipelineResult {
    let sink = DiagnosticSink::new();
    let driver = PluginDriver::new(Arch::new(arch));
    let batches = driver.run(units, store, &sink).unwrap();
    let resources = batches
        .iter()
        .map(|batch| collect_resources(batch, store, linker, cache, &sink).unwrap())
        .collect();
    let diagnostics = sink.diagnostics();
    let error_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    PipelineResult {
        resources,
        has_errors: error_count > 0,
        error_count,
        diagnostics,
    }
}
