//! Cross-unit plugin execution with per-processor fault isolation.

use crate::batch::SourceBatch;
use crate::processor::{ProcessorId, SourceProcessor};
use crate::slot::PluginFile;
use crate::unit::{CompilationUnit, PackageStore};
use std::collections::HashMap;
use std::sync::Arc;
use weld_common::{Arch, InternalError, WeldResult};
use weld_diagnostics::{Diagnostic, DiagnosticSink};

/// Drives plugin execution for all compilation units of one target.
///
/// Slots are grouped across units by processor identity, so a processor
/// serving resources from many units is still invoked exactly once per
/// build, with its full cross-unit input set. Each processor group only
/// mutates the slots assigned to it; no slot is ever shared between groups.
pub struct PluginDriver {
    arch: Arch,
}

impl PluginDriver {
    /// Creates a driver for one target architecture.
    pub fn new(arch: Arch) -> Self {
        Self { arch }
    }

    /// The driver's target architecture.
    pub fn arch(&self) -> &Arch {
        &self.arch
    }

    /// Builds a batch per unit, then invokes every matched processor once.
    ///
    /// A failure raised by a processor's entry point is caught and recorded
    /// as a diagnostic tagged with the processor's owning package and this
    /// target's architecture; the remaining processors still run. Callers
    /// must check the sink for accumulated diagnostics after `run` returns
    /// rather than relying on `Err`, which is reserved for internal bugs.
    pub fn run(
        &self,
        units: Vec<CompilationUnit>,
        store: &dyn PackageStore,
        sink: &DiagnosticSink,
    ) -> WeldResult<Vec<SourceBatch>> {
        for unit in &units {
            if !self.arch.matches(unit.arch.as_str()) {
                return Err(InternalError::new(format!(
                    "unit of arch '{}' does not support target '{}'",
                    unit.arch, self.arch
                )));
            }
        }

        let mut batches = units
            .into_iter()
            .map(|unit| SourceBatch::build(unit, store, sink))
            .collect::<WeldResult<Vec<_>>>()?;

        // Group slots by processor identity, keeping first-seen order so
        // invocation order is deterministic across builds.
        let mut order: Vec<ProcessorId> = Vec::new();
        let mut processors: HashMap<ProcessorId, Arc<SourceProcessor>> = HashMap::new();
        for batch in &batches {
            for slot in batch.slots() {
                if let Some(processor) = slot.processor() {
                    if !processors.contains_key(&processor.id) {
                        order.push(processor.id.clone());
                        processors.insert(processor.id.clone(), Arc::clone(processor));
                    }
                }
            }
        }

        for id in &order {
            let processor = &processors[id];
            let mut files: Vec<PluginFile<'_>> = Vec::new();
            for batch in batches.iter_mut() {
                for slot in batch.slots_mut() {
                    if slot.processor_id() == Some(id) {
                        files.push(PluginFile::new(slot));
                    }
                }
            }
            if let Err(err) = processor.plugin().process_files(&mut files) {
                sink.emit(Diagnostic::error(
                    Some(&processor.package),
                    &self.arch,
                    format!(
                        "while processing files with {} (for target {}): {err}",
                        processor.package, self.arch
                    ),
                ));
            }
        }

        Ok(batches)
    }
}
