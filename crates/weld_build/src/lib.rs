//! The compile stage of the Weld build pipeline.
//!
//! Given a compilation unit (one package-or-application's resource set for
//! one target architecture), this crate dispatches each source resource to
//! the transformation plugin claiming its extension or exact filename,
//! accumulates the resources each plugin produces, and hands the flattened
//! results to the link stage (`weld_link`).
//!
//! # Pipeline
//!
//! 1. [`SourceBatch::build`] merges the source-processor claims of every
//!    active upstream package into a [`SourceProcessorSet`] and constructs
//!    one [`ResourceSlot`] per resource.
//! 2. [`PluginDriver::run`] groups slots across all batches of a target by
//!    processor identity and invokes each [`Plugin`] exactly once per build
//!    with its full cross-unit input set, isolating failures per processor.
//! 3. Plugins mutate slots through the capability-limited [`PluginFile`]
//!    view, appending code, stylesheets, assets, and document fragments.
//!
//! Per-resource and per-plugin failures are recorded in the
//! [`DiagnosticSink`](weld_diagnostics::DiagnosticSink) and never abort the
//! remaining work; callers check the sink after the run.

#![warn(missing_docs)]

pub mod batch;
pub mod driver;
pub mod error;
pub mod processor;
pub mod resource;
pub mod slot;
pub mod unit;

pub use batch::SourceBatch;
pub use driver::PluginDriver;
pub use error::BuildError;
pub use processor::{Plugin, ProcessorId, SourceProcessor, SourceProcessorSet, PASSTHROUGH_EXTENSION};
pub use resource::{
    AssetData, AssetOptions, AssetResource, CodeOptions, CodeResource, FileOptions,
    FragmentResource, RawKind, RawResource, Resource, ResourceKind, SourceMap, SourceMapInput,
    StylesheetOptions, StylesheetResource,
};
pub use slot::{PluginFile, ResourceSlot};
pub use unit::{CompilationUnit, Dependency, Export, PackageStore, PluginPackage, UnitKind};
