//! Structured diagnostic messages tagged with package and architecture.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use weld_common::Arch;

/// A structured diagnostic message produced while building one target.
///
/// Every diagnostic records which package was being processed when the
/// problem occurred (`None` for the top-level application) and the target
/// architecture of the build, so aggregated diagnostics from a multi-target
/// build remain attributable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The package being processed, or `None` for the application.
    pub package: Option<String>,
    /// The target architecture of the build that produced this diagnostic.
    pub arch: Arch,
    /// The main diagnostic message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(package: Option<&str>, arch: &Arch, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            package: package.map(str::to_string),
            arch: arch.clone(),
            message: message.into(),
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(package: Option<&str>, arch: &Arch, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            package: package.map(str::to_string),
            arch: arch.clone(),
            message: message.into(),
        }
    }

    /// Returns the package display name, `"the application"` when the
    /// diagnostic belongs to the top-level app.
    pub fn package_display(&self) -> &str {
        self.package.as_deref().unwrap_or("the application")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (in {}, for {})",
            self.severity,
            self.message,
            self.package_display(),
            self.arch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_error() {
        let arch = Arch::new("web.browser");
        let diag = Diagnostic::error(Some("coffee"), &arch, "no plugin found for a.coffee");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.package.as_deref(), Some("coffee"));
        assert_eq!(diag.arch, arch);
    }

    #[test]
    fn app_package_display() {
        let arch = Arch::new("os");
        let diag = Diagnostic::warning(None, &arch, "something odd");
        assert_eq!(diag.package_display(), "the application");
    }

    #[test]
    fn display_format() {
        let arch = Arch::new("web.browser");
        let diag = Diagnostic::error(Some("less"), &arch, "bad stylesheet");
        assert_eq!(
            format!("{diag}"),
            "error: bad stylesheet (in less, for web.browser)"
        );
    }

    #[test]
    fn serde_roundtrip() {
        let arch = Arch::new("os.linux.x86_64");
        let diag = Diagnostic::error(None, &arch, "link failed");
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, "link failed");
        assert_eq!(back.arch, arch);
    }
}
