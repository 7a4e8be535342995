//! Per-unit link options.

use crate::symbols::compute_imports;
use serde::Serialize;
use std::collections::BTreeMap;
use weld_build::{CompilationUnit, PackageStore, UnitKind};
use weld_common::convert_colons;

/// Serve path of the synthetic import stub emitted for the application.
pub const IMPORT_STUB_SERVE_PATH: &str = "/packages/global-imports.js";

/// Options controlling how one unit's code outputs are linked.
///
/// Serialized (canonically, via `BTreeMap` and stable field order) into the
/// link-cache key, so every field must be deterministic for identical
/// inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkOptions {
    /// Place linked code in the shared global namespace. True only for the
    /// top-level application; packages must not pollute it.
    pub use_global_namespace: bool,

    /// The single serve path all of a package's code is combined under;
    /// `None` for the application, which uses the global namespace and
    /// needs no combined path.
    pub combined_serve_path: Option<String>,

    /// The unit's package name, `None` for the application.
    pub name: Option<String>,

    /// Names this unit declares as exports.
    pub declared_exports: Vec<String>,

    /// Imported symbol name to the package that supplies it.
    pub imports: BTreeMap<String, String>,

    /// Where to serve the application's import stub.
    pub import_stub_serve_path: Option<String>,

    /// Emit source-map loading instructions (web targets only).
    pub include_source_map_instructions: bool,
}

impl LinkOptions {
    /// Derives the link options for one compilation unit, merging imports
    /// from its dependencies' declared exports.
    pub fn for_unit(unit: &CompilationUnit, store: &dyn PackageStore) -> Self {
        let is_app = unit.is_app();
        let combined_serve_path = unit.package.as_ref().map(|name| {
            let base = match unit.kind {
                UnitKind::Main => name.clone(),
                kind => format!("{}:{}", name, kind.as_str()),
            };
            format!("/packages/{}.js", convert_colons(&base))
        });
        Self {
            use_global_namespace: is_app,
            combined_serve_path,
            name: unit.package.clone(),
            declared_exports: unit
                .declared_exports
                .iter()
                .map(|e| e.name.clone())
                .collect(),
            imports: compute_imports(unit, store),
            import_stub_serve_path: is_app.then(|| IMPORT_STUB_SERVE_PATH.to_string()),
            include_source_map_instructions: unit.arch.matches("web"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_build::{Export, PluginPackage};
    use weld_common::Arch;
    use std::sync::Arc;

    struct EmptyStore;

    impl PackageStore for EmptyStore {
        fn active_plugin_packages(&self, _unit: &CompilationUnit) -> Vec<Arc<PluginPackage>> {
            vec![]
        }

        fn exports_of(&self, _package: &str, _arch: &Arch) -> Option<Vec<Export>> {
            None
        }
    }

    fn unit(package: Option<&str>, arch: &str, kind: UnitKind) -> CompilationUnit {
        CompilationUnit {
            package: package.map(str::to_string),
            arch: Arch::new(arch),
            kind,
            is_test: false,
            declared_exports: vec![Export::new("Widget")],
            dependencies: vec![],
            resources: vec![],
        }
    }

    #[test]
    fn app_options() {
        let u = unit(None, "web.browser", UnitKind::Main);
        let options = LinkOptions::for_unit(&u, &EmptyStore);
        assert!(options.use_global_namespace);
        assert_eq!(options.combined_serve_path, None);
        assert_eq!(options.name, None);
        assert_eq!(
            options.import_stub_serve_path.as_deref(),
            Some(IMPORT_STUB_SERVE_PATH)
        );
        assert!(options.include_source_map_instructions);
    }

    #[test]
    fn package_options() {
        let u = unit(Some("accounts"), "os.linux.x86_64", UnitKind::Main);
        let options = LinkOptions::for_unit(&u, &EmptyStore);
        assert!(!options.use_global_namespace);
        assert_eq!(
            options.combined_serve_path.as_deref(),
            Some("/packages/accounts.js")
        );
        assert_eq!(options.name.as_deref(), Some("accounts"));
        assert_eq!(options.import_stub_serve_path, None);
        assert!(!options.include_source_map_instructions);
        assert_eq!(options.declared_exports, vec!["Widget".to_string()]);
    }

    #[test]
    fn plugin_unit_serve_path_includes_kind() {
        let u = unit(Some("user:build"), "os", UnitKind::Plugin);
        let options = LinkOptions::for_unit(&u, &EmptyStore);
        assert_eq!(
            options.combined_serve_path.as_deref(),
            Some("/packages/user_build_plugin.js")
        );
    }
}
