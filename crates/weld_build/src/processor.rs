//! Source processors and the per-unit claim registry.

use crate::error::BuildError;
use crate::slot::PluginFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use weld_common::Arch;

/// Built-in extension for plain, untransformed code.
///
/// A source file with this extension and no claiming processor is not an
/// error: its contents pass straight through as a code output.
pub const PASSTHROUGH_EXTENSION: &str = "js";

/// Stable identity of a source processor across packages and builds.
///
/// Two units served by the same processor id share one plugin invocation
/// per build.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessorId(String);

impl ProcessorId {
    /// Creates a processor id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transformation plugin's entry point.
///
/// Invoked at most once per build with every matched file across all units
/// of the target. All output is produced by side-effecting mutator calls on
/// the given [`PluginFile`]s; the return value only signals failure, which
/// the driver records as a diagnostic against the owning package.
pub trait Plugin: Send + Sync {
    /// Processes the full batch of matched files.
    fn process_files(&self, files: &mut [PluginFile<'_>]) -> Result<(), BuildError>;
}

/// A transformation capability declared by an upstream package.
pub struct SourceProcessor {
    /// Stable identity, unique among all active processors.
    pub id: ProcessorId,
    /// Display name of the declaring package, used in diagnostics.
    pub package: String,
    /// Extensions this processor claims (without the leading dot).
    pub extensions: Vec<String>,
    /// Exact filenames this processor claims.
    pub filenames: Vec<String>,
    /// Architecture families this processor applies to; empty means all.
    pub archs: Vec<String>,
    plugin: Arc<dyn Plugin>,
}

impl SourceProcessor {
    /// Creates a processor with no claims; chain the `claiming_*` builders.
    pub fn new(
        id: ProcessorId,
        package: impl Into<String>,
        plugin: Arc<dyn Plugin>,
    ) -> Self {
        Self {
            id,
            package: package.into(),
            extensions: Vec::new(),
            filenames: Vec::new(),
            archs: Vec::new(),
            plugin,
        }
    }

    /// Adds claimed extensions.
    pub fn claiming_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions
            .extend(extensions.iter().map(|e| e.to_string()));
        self
    }

    /// Adds claimed exact filenames.
    pub fn claiming_filenames(mut self, filenames: &[&str]) -> Self {
        self.filenames
            .extend(filenames.iter().map(|f| f.to_string()));
        self
    }

    /// Restricts the processor to the given architecture families.
    pub fn for_archs(mut self, archs: &[&str]) -> Self {
        self.archs.extend(archs.iter().map(|a| a.to_string()));
        self
    }

    /// Returns `true` if this processor applies to the given architecture.
    pub fn claims_arch(&self, arch: &Arch) -> bool {
        self.archs.is_empty() || self.archs.iter().any(|family| arch.matches(family))
    }

    /// The plugin entry point.
    pub fn plugin(&self) -> &dyn Plugin {
        &*self.plugin
    }
}

impl fmt::Debug for SourceProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceProcessor")
            .field("id", &self.id)
            .field("package", &self.package)
            .field("extensions", &self.extensions)
            .field("filenames", &self.filenames)
            .field("archs", &self.archs)
            .finish_non_exhaustive()
    }
}

/// The per-unit claim registry mapping extensions and exact filenames to
/// source processors.
///
/// Built once per compilation unit by merging the processor sets of every
/// active upstream package. On claim collision the most recently merged
/// processor wins, so a more specific or more recently declared dependency
/// can override a transitively pulled-in default.
pub struct SourceProcessorSet {
    owner: String,
    by_extension: HashMap<String, Arc<SourceProcessor>>,
    by_filename: HashMap<String, Arc<SourceProcessor>>,
}

impl SourceProcessorSet {
    /// Creates an empty registry for the named unit (used in messages).
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            by_extension: HashMap::new(),
            by_filename: HashMap::new(),
        }
    }

    /// The display name of the unit this registry was built for.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Merges another package's processors, filtered to those applicable to
    /// `arch`. Later merges override earlier claims.
    pub fn merge(&mut self, processors: &[Arc<SourceProcessor>], arch: &Arch) {
        for processor in processors {
            if !processor.claims_arch(arch) {
                continue;
            }
            for ext in &processor.extensions {
                self.by_extension.insert(ext.clone(), Arc::clone(processor));
            }
            for filename in &processor.filenames {
                self.by_filename
                    .insert(filename.clone(), Arc::clone(processor));
            }
        }
    }

    /// Returns the processor claiming the given extension, if any.
    pub fn get_by_extension(&self, extension: &str) -> Option<Arc<SourceProcessor>> {
        self.by_extension.get(extension).cloned()
    }

    /// Returns the processor claiming the given exact filename, falling
    /// back to the longest claimed extension of the filename.
    ///
    /// Exact filename claims always win over extension claims, so a
    /// file-level override can opt a specific file out of extension-wide
    /// processing.
    pub fn get_by_filename(&self, filename: &str) -> Option<Arc<SourceProcessor>> {
        if let Some(processor) = self.by_filename.get(filename) {
            return Some(Arc::clone(processor));
        }
        // Longest suffix first: "conf.tar.gz" tries "tar.gz" before "gz".
        for (idx, _) in filename.match_indices('.') {
            if let Some(processor) = self.by_extension.get(&filename[idx + 1..]) {
                return Some(Arc::clone(processor));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPlugin;

    impl Plugin for NoopPlugin {
        fn process_files(&self, _files: &mut [PluginFile<'_>]) -> Result<(), BuildError> {
            Ok(())
        }
    }

    fn processor(id: &str, package: &str) -> SourceProcessor {
        SourceProcessor::new(ProcessorId::new(id), package, Arc::new(NoopPlugin))
    }

    #[test]
    fn extension_lookup() {
        let mut set = SourceProcessorSet::new("app");
        let p = Arc::new(processor("coffee/1", "coffee").claiming_extensions(&["coffee"]));
        set.merge(&[p], &Arch::new("web.browser"));
        assert_eq!(
            set.get_by_extension("coffee").unwrap().id,
            ProcessorId::new("coffee/1")
        );
        assert!(set.get_by_extension("less").is_none());
    }

    #[test]
    fn later_merge_wins() {
        let mut set = SourceProcessorSet::new("app");
        let arch = Arch::new("web.browser");
        let first = Arc::new(processor("css/default", "css").claiming_extensions(&["css"]));
        let second = Arc::new(processor("css/override", "fancy-css").claiming_extensions(&["css"]));
        set.merge(&[first], &arch);
        set.merge(&[second], &arch);
        assert_eq!(
            set.get_by_extension("css").unwrap().id,
            ProcessorId::new("css/override")
        );
    }

    #[test]
    fn arch_filter_applies() {
        let mut set = SourceProcessorSet::new("app");
        let server_only =
            Arc::new(processor("tmpl/1", "tmpl").claiming_extensions(&["tmpl"]).for_archs(&["os"]));
        set.merge(&[server_only.clone()], &Arch::new("web.browser"));
        assert!(set.get_by_extension("tmpl").is_none());
        set.merge(&[server_only], &Arch::new("os.linux.x86_64"));
        assert!(set.get_by_extension("tmpl").is_some());
    }

    #[test]
    fn exact_filename_beats_extension() {
        let mut set = SourceProcessorSet::new("app");
        let arch = Arch::new("web.browser");
        let by_ext = Arc::new(processor("json/ext", "json").claiming_extensions(&["json"]));
        let by_name =
            Arc::new(processor("json/exact", "configurator").claiming_filenames(&["app.json"]));
        set.merge(&[by_ext, by_name], &arch);
        assert_eq!(
            set.get_by_filename("app.json").unwrap().id,
            ProcessorId::new("json/exact")
        );
        assert_eq!(
            set.get_by_filename("other.json").unwrap().id,
            ProcessorId::new("json/ext")
        );
    }

    #[test]
    fn longest_extension_preferred() {
        let mut set = SourceProcessorSet::new("app");
        let arch = Arch::new("os");
        let gz = Arc::new(processor("gz", "gzip").claiming_extensions(&["gz"]));
        let targz = Arc::new(processor("tar.gz", "tarball").claiming_extensions(&["tar.gz"]));
        set.merge(&[gz, targz], &arch);
        assert_eq!(
            set.get_by_filename("data.tar.gz").unwrap().id,
            ProcessorId::new("tar.gz")
        );
        assert_eq!(set.get_by_filename("data.gz").unwrap().id, ProcessorId::new("gz"));
    }
}
