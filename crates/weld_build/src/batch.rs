//! Grouping of resource slots for one compilation unit.

use crate::processor::{SourceProcessorSet, PASSTHROUGH_EXTENSION};
use crate::resource::{CodeResource, RawKind, Resource};
use crate::slot::ResourceSlot;
use crate::unit::{CompilationUnit, PackageStore};
use std::sync::Arc;
use weld_diagnostics::{Diagnostic, DiagnosticSink};
use weld_common::WeldResult;

/// All resource slots for one compilation unit, with each source resource
/// resolved to its processor.
pub struct SourceBatch {
    unit: Arc<CompilationUnit>,
    slots: Vec<ResourceSlot>,
}

impl SourceBatch {
    /// Builds the batch for a unit: merges the processor claims of every
    /// active upstream package, then constructs one slot per resource.
    ///
    /// A source resource whose extension or filename resolves to no
    /// processor is a recoverable error: a diagnostic is recorded, the
    /// resource is dropped, and the batch keeps building the remaining
    /// slots.
    pub fn build(
        unit: CompilationUnit,
        store: &dyn PackageStore,
        sink: &DiagnosticSink,
    ) -> WeldResult<Self> {
        let unit = Arc::new(unit);
        let processors = Self::processor_set(&unit, store);
        let mut slots = Vec::with_capacity(unit.resources.len());

        for resource in &unit.resources {
            let mut processor = None;
            if resource.kind == RawKind::Source {
                match resource.extension.as_deref() {
                    None => {
                        let filename = resource.basename();
                        match processors.get_by_filename(filename) {
                            Some(found) => processor = Some(found),
                            None => {
                                sink.emit(Diagnostic::error(
                                    unit.package.as_deref(),
                                    &unit.arch,
                                    format!(
                                        "no plugin found for {} in {}; a plugin for {} was \
                                         active when it was published but none is now",
                                        resource.path,
                                        unit.display_name(),
                                        filename
                                    ),
                                ));
                                // recover by dropping the resource
                                continue;
                            }
                        }
                    }
                    Some(extension) => match processors.get_by_extension(extension) {
                        Some(found) => processor = Some(found),
                        // Plain code needs no processor; the slot passes
                        // it through.
                        None if extension == PASSTHROUGH_EXTENSION => {}
                        None => {
                            sink.emit(Diagnostic::error(
                                unit.package.as_deref(),
                                &unit.arch,
                                format!(
                                    "no plugin found for {} in {}; a plugin for *.{} was \
                                     active when it was published but none is now",
                                    resource.path,
                                    unit.display_name(),
                                    extension
                                ),
                            ));
                            continue;
                        }
                    },
                }
            }
            slots.push(ResourceSlot::new(
                resource.clone(),
                processor,
                Arc::clone(&unit),
            )?);
        }

        Ok(Self { unit, slots })
    }

    /// Resolves the unit's processor registry by merging the processor
    /// sets of every active upstream package, restricted to the build's
    /// target architecture. Later packages override earlier claims.
    fn processor_set(unit: &CompilationUnit, store: &dyn PackageStore) -> SourceProcessorSet {
        let mut set = SourceProcessorSet::new(unit.display_name());
        for package in store.active_plugin_packages(unit) {
            set.merge(&package.processors, &unit.arch);
        }
        set
    }

    /// The unit this batch was built for.
    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    /// The batch's slots, in resource declaration order.
    pub fn slots(&self) -> &[ResourceSlot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [ResourceSlot] {
        &mut self.slots
    }

    /// Flattens every slot's code outputs, in slot order then call order.
    ///
    /// These are the inputs to the link stage.
    pub fn code_resources(&self) -> Vec<CodeResource> {
        self.slots
            .iter()
            .flat_map(|slot| slot.code_outputs().iter().cloned())
            .collect()
    }

    /// Flattens every slot's non-code outputs, in slot order then call
    /// order.
    pub fn other_resources(&self) -> Vec<Resource> {
        self.slots
            .iter()
            .flat_map(|slot| slot.other_outputs().iter().cloned())
            .collect()
    }
}
