//! Build architecture names with hierarchical matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dotted build-architecture name such as `web.browser` or
/// `os.linux.x86_64`.
///
/// Architecture names form a hierarchy on dot boundaries: `web.browser`
/// matches the family `web`, and `os.linux.x86_64` matches both `os` and
/// `os.linux`. Source processors declare the families they apply to, and
/// document fragments may only be emitted for architectures in the `web`
/// family.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arch(String);

impl Arch {
    /// Creates an architecture from a dotted name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the full dotted name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this architecture belongs to the given family.
    ///
    /// A family matches when it equals the full name or is a dot-boundary
    /// prefix of it: `web.browser` matches `web` but not `we`.
    pub fn matches(&self, family: &str) -> bool {
        if self.0 == family {
            return true;
        }
        self.0.len() > family.len()
            && self.0.starts_with(family)
            && self.0.as_bytes()[family.len()] == b'.'
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Arch {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
