//! Error types for plugin mutator calls and plugin entry points.

/// Errors raised synchronously at a plugin mutator call site, or returned
/// by a plugin entry point.
///
/// These are programmer errors in plugin code, not build diagnostics: they
/// fail the mutator call immediately and surface as the invoking plugin's
/// own failure. The [`PluginDriver`](crate::PluginDriver) then records that
/// failure as a diagnostic tagged with the plugin's owning package.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A mutator requiring an assigned processor was called on a slot
    /// without one.
    #[error("{mutator} called on a slot with no assigned processor: {path}")]
    NoProcessor {
        /// The mutator that was called.
        mutator: &'static str,
        /// Path of the slot's input resource.
        path: String,
    },

    /// A document-fragment section other than `head` or `body`.
    #[error("document fragment section must be \"head\" or \"body\", got {0:?}")]
    InvalidSection(String),

    /// A document fragment was added for a non-web architecture.
    #[error("document fragments can only be emitted for web architectures, target is {0}")]
    NotWebArch(String),

    /// A text source map that could not be parsed as JSON.
    #[error("invalid source map for {path}: {message}")]
    SourceMap {
        /// Serve path or requested path of the resource the map belongs to.
        path: String,
        /// Parse failure description.
        message: String,
    },

    /// A failure reported by the plugin itself from its entry point.
    #[error("{0}")]
    Plugin(String),
}

impl BuildError {
    /// Creates a plugin-reported failure from any displayable error.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::Plugin(message.into())
    }
}
