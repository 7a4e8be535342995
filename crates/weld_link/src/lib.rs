//! The link stage of the Weld build pipeline.
//!
//! After the compile stage (`weld_build`) has run every plugin, each unit's
//! accumulated code outputs are combined by a [`Linker`] into the module
//! files actually served, under the per-unit [`LinkOptions`]. Because
//! linking is the most expensive step of a rebuild, results are memoized in
//! a byte-budgeted [`LinkCache`] keyed by the link inputs' identity rather
//! than their contents.

#![warn(missing_docs)]

pub mod cache;
pub mod options;
pub mod symbols;

pub use cache::{CacheKey, CacheStats, LinkCache};
pub use options::{LinkOptions, IMPORT_STUB_SERVE_PATH};
pub use symbols::compute_imports;

use std::sync::Arc;
use weld_build::{
    CodeResource, PackageStore, Resource, SourceBatch, SourceMap, SourceMapInput,
};
use weld_common::{ContentHash, InternalError, WeldResult};
use weld_diagnostics::{Diagnostic, DiagnosticSink};

/// A linking failure, reported against the failing unit.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct LinkError(pub String);

impl LinkError {
    /// Creates a link error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One file produced by linking a unit's code.
#[derive(Debug, Clone)]
pub struct LinkedFile {
    /// The path the linked file is served at.
    pub serve_path: String,
    /// The linked source text.
    pub source: String,
    /// Optional source map for the linked text.
    pub source_map: Option<SourceMapInput>,
}

/// Combines one unit's code outputs into its served module files.
pub trait Linker: Send + Sync {
    /// Links `files` under `options`, returning the served files.
    ///
    /// An `Err` means the unit's code could not be linked; it is reported
    /// as a diagnostic against the unit and the unit contributes no code
    /// output, without aborting the rest of the build.
    fn link(&self, files: &[CodeResource], options: &LinkOptions)
        -> Result<Vec<LinkedFile>, LinkError>;
}

/// Produces a batch's final output resources: every non-code output as-is,
/// followed by the unit's linked code.
///
/// The link result is looked up in `cache` first; on a miss the `linker`
/// runs and its result is cached. A linker failure is recorded in `sink`
/// and the non-code resources are still returned.
pub fn collect_resources(
    batch: &SourceBatch,
    store: &dyn PackageStore,
    linker: &dyn Linker,
    cache: &LinkCache,
    sink: &DiagnosticSink,
) -> WeldResult<Vec<Resource>> {
    let unit = batch.unit();
    let mut resources = batch.other_resources();
    let code = batch.code_resources();

    let options = LinkOptions::for_unit(unit, store);
    let key = CacheKey::compute(&options, &code)?;
    if let Some(cached) = cache.get(&key) {
        resources.extend(cached.iter().cloned().map(Resource::Code));
        return Ok(resources);
    }

    match linker.link(&code, &options) {
        Ok(files) => {
            let mut linked = Vec::with_capacity(files.len());
            for file in files {
                // A malformed source map here is a linker bug, not a user
                // error.
                let source_map = match file.source_map {
                    Some(map) => Some(SourceMap::parse(map, &file.serve_path).map_err(|e| {
                        InternalError::new(format!("linker produced an invalid source map: {e}"))
                    })?),
                    None => None,
                };
                let data = file.source.into_bytes();
                linked.push(CodeResource {
                    serve_path: file.serve_path,
                    hash: ContentHash::from_bytes(&data),
                    data,
                    source_map,
                    bare: false,
                });
            }
            let linked = Arc::new(linked);
            cache.insert(key, Arc::clone(&linked));
            resources.extend(linked.iter().cloned().map(Resource::Code));
        }
        Err(err) => {
            sink.emit(Diagnostic::error(
                unit.package.as_deref(),
                &unit.arch,
                format!("linking failed for {}: {err}", unit.display_name()),
            ));
        }
    }

    Ok(resources)
}
