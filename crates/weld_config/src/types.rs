//! Configuration types deserialized from `weld.toml`.

use serde::Deserialize;

/// Default link-cache byte budget: 100 MiB.
pub const DEFAULT_LINK_CACHE_BYTES: u64 = 100 * 1024 * 1024;

/// The top-level build configuration parsed from `weld.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Link-cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
        }
    }
}

/// Settings for the process-lifetime link cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Total byte budget for cached link output (code bytes plus
    /// source-map bytes). Least-recently-used entries are evicted once the
    /// budget is exceeded.
    #[serde(default = "default_link_bytes")]
    pub link_bytes: u64,

    /// Whether the cache keeps hit/miss counters. Off by default; enabled
    /// when investigating rebuild performance.
    #[serde(default)]
    pub track_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            link_bytes: DEFAULT_LINK_CACHE_BYTES,
            track_stats: false,
        }
    }
}

fn default_link_bytes() -> u64 {
    DEFAULT_LINK_CACHE_BYTES
}
