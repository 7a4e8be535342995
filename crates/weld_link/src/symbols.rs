//! Import symbol resolution from a unit's dependency list.

use std::collections::BTreeMap;
use weld_build::{CompilationUnit, PackageStore};

/// Computes the symbols a unit imports, as symbol name to supplying
/// package.
///
/// Dependencies are walked in declaration order. Unordered, weak, and
/// debug-only dependencies never contribute imports; test-only exports are
/// only visible to test units. When two dependencies export the same
/// symbol, the later declaration wins.
pub fn compute_imports(
    unit: &CompilationUnit,
    store: &dyn PackageStore,
) -> BTreeMap<String, String> {
    let mut imports = BTreeMap::new();
    for dep in &unit.dependencies {
        if !dep.provides_imports() {
            continue;
        }
        let Some(exports) = store.exports_of(&dep.package, &unit.arch) else {
            continue;
        };
        for export in exports {
            if export.test_only && !unit.is_test {
                continue;
            }
            imports.insert(export.name, dep.package.clone());
        }
    }
    imports
}
