//! Compilation unit identity and the upstream package capability query.

use crate::processor::SourceProcessor;
use crate::resource::RawResource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use weld_common::{convert_colons, Arch};

/// The kind of a compilation unit within its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// The package's main unit.
    Main,
    /// A build-plugin unit.
    Plugin,
}

impl UnitKind {
    /// Returns the lowercase kind name.
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Main => "main",
            UnitKind::Plugin => "plugin",
        }
    }
}

/// A symbol name a unit's code makes available to dependents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    /// The exported symbol name.
    pub name: String,
    /// Only visible to test units of dependents.
    #[serde(default)]
    pub test_only: bool,
}

impl Export {
    /// Creates a regular export.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            test_only: false,
        }
    }

    /// Creates a test-only export.
    pub fn test_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            test_only: true,
        }
    }
}

/// One entry of a unit's declared dependency list, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The depended-on package name.
    pub package: String,
    /// Load order relative to this unit is unspecified; its symbols must
    /// not be imported.
    #[serde(default)]
    pub unordered: bool,
    /// The dependency is only used if something else pulls it in; its
    /// symbols must not be imported.
    #[serde(default)]
    pub weak: bool,
    /// Only present in debug builds; its symbols must not be imported.
    #[serde(default)]
    pub debug_only: bool,
}

impl Dependency {
    /// Creates an ordinary (ordered, strong) dependency.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            unordered: false,
            weak: false,
            debug_only: false,
        }
    }

    /// Returns `true` if symbols may be imported from this dependency.
    pub fn provides_imports(&self) -> bool {
        !self.unordered && !self.weak && !self.debug_only
    }
}

/// One package-or-application's resource set for one target architecture.
///
/// Owned by the caller and read-only to the pipeline; the pipeline's mutable
/// processing state lives in [`ResourceSlot`](crate::ResourceSlot)s.
#[derive(Debug)]
pub struct CompilationUnit {
    /// The owning package name, or `None` for the top-level application.
    pub package: Option<String>,
    /// The build's target architecture.
    pub arch: Arch,
    /// The unit's kind within its package.
    pub kind: UnitKind,
    /// Whether this unit is a test unit (sees test-only exports).
    pub is_test: bool,
    /// Exported symbol names declared by this unit.
    pub declared_exports: Vec<Export>,
    /// Declared dependencies, in declaration order.
    pub dependencies: Vec<Dependency>,
    /// The unit's input resources.
    pub resources: Vec<RawResource>,
}

impl CompilationUnit {
    /// Returns `true` for the top-level application unit.
    pub fn is_app(&self) -> bool {
        self.package.is_none()
    }

    /// Display name for error messages.
    pub fn display_name(&self) -> &str {
        self.package.as_deref().unwrap_or("the application")
    }

    /// The root all of this unit's serve paths are joined under:
    /// `/packages/<name>` for a package, `/` for the application.
    pub fn serve_root(&self) -> String {
        match &self.package {
            Some(name) => format!("/packages/{}", convert_colons(name)),
            None => "/".to_string(),
        }
    }

    /// Derives the serve path for a resource path within this unit.
    pub fn serve_path(&self, path: &str) -> String {
        let trimmed = path.trim_start_matches('/');
        match &self.package {
            Some(_) => format!("{}/{}", self.serve_root(), convert_colons(trimmed)),
            None => format!("/{}", convert_colons(trimmed)),
        }
    }
}

/// An upstream package contributing source processors to a unit's registry.
#[derive(Clone)]
pub struct PluginPackage {
    /// The package's display name.
    pub name: String,
    /// The processors the package declares, in declaration order.
    pub processors: Vec<Arc<SourceProcessor>>,
}

/// The upstream package metadata store, an external collaborator.
///
/// Implementations resolve a unit's declared dependencies against installed
/// package metadata. The pipeline only consumes the two queries below;
/// discovery and loading of installed packages is out of scope.
pub trait PackageStore {
    /// The ordered list of upstream packages whose source processors are
    /// active for this unit.
    fn active_plugin_packages(&self, unit: &CompilationUnit) -> Vec<Arc<PluginPackage>>;

    /// The declared exports of a package for the given architecture, or
    /// `None` if the package is unknown.
    fn exports_of(&self, package: &str, arch: &Arch) -> Option<Vec<Export>>;
}
