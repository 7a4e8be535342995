//! Byte-budgeted LRU cache of linked output, keyed by link inputs.

use crate::options::LinkOptions;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use weld_build::CodeResource;
use weld_common::{ContentHash, InternalError, WeldResult};
use weld_config::BuildConfig;

/// Identity of one link operation: the link options plus the serve path,
/// content hash, and bare flag of every input file, in order.
///
/// The key deliberately covers hashes rather than file contents, so key
/// computation stays cheap no matter how large the unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(ContentHash);

#[derive(Serialize)]
struct KeyPayload<'a> {
    options: &'a LinkOptions,
    files: Vec<KeyFile<'a>>,
}

#[derive(Serialize)]
struct KeyFile<'a> {
    serve_path: &'a str,
    hash: &'a ContentHash,
    bare: bool,
}

impl CacheKey {
    /// Computes the cache key for linking `files` under `options`.
    pub fn compute(options: &LinkOptions, files: &[CodeResource]) -> WeldResult<Self> {
        let payload = KeyPayload {
            options,
            files: files
                .iter()
                .map(|f| KeyFile {
                    serve_path: &f.serve_path,
                    hash: &f.hash,
                    bare: f.bare,
                })
                .collect(),
        };
        let bytes = serde_json::to_vec(&payload).map_err(|e| {
            InternalError::new(format!("link cache key serialization failed: {e}"))
        })?;
        Ok(Self(ContentHash::from_bytes(&bytes)))
    }
}

/// Hit and miss counters, reported when stat tracking is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through to the linker.
    pub misses: u64,
}

struct CacheEntry {
    value: Arc<Vec<CodeResource>>,
    bytes: u64,
    last_used: u64,
}

struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    total_bytes: u64,
    tick: u64,
    stats: CacheStats,
}

/// A byte-budgeted LRU cache of linked code resources.
///
/// Entry sizes count code bytes plus serialized source-map bytes. Inserting
/// past the budget evicts least-recently-used entries until the total fits;
/// a single entry larger than the whole budget is evicted immediately after
/// insertion. Entry counts are small (one per linked unit), so eviction
/// scans the table rather than maintaining an ordered list.
pub struct LinkCache {
    inner: Mutex<CacheInner>,
    budget: u64,
    track_stats: bool,
}

impl LinkCache {
    /// Creates a cache with the given byte budget.
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                total_bytes: 0,
                tick: 0,
                stats: CacheStats::default(),
            }),
            budget: budget_bytes,
            track_stats: false,
        }
    }

    /// Creates a cache sized and configured from the build configuration.
    pub fn from_config(config: &BuildConfig) -> Self {
        let mut cache = Self::new(config.cache.link_bytes);
        cache.track_stats = config.cache.track_stats;
        cache
    }

    /// Enables hit/miss counting.
    pub fn with_stats(mut self) -> Self {
        self.track_stats = true;
        self
    }

    /// Looks up a previously linked result, refreshing its recency.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<CodeResource>>> {
        let mut inner = self.inner.lock().unwrap();
        inner.tick += 1;
        let tick = inner.tick;
        let hit = match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = tick;
                Some(Arc::clone(&entry.value))
            }
            None => None,
        };
        if self.track_stats {
            match hit {
                Some(_) => inner.stats.hits += 1,
                None => inner.stats.misses += 1,
            }
        }
        hit
    }

    /// Inserts a linked result, evicting least-recently-used entries while
    /// the total exceeds the byte budget.
    pub fn insert(&self, key: CacheKey, value: Arc<Vec<CodeResource>>) {
        let bytes = value_bytes(&value);
        let mut inner = self.inner.lock().unwrap();
        inner.tick += 1;
        let tick = inner.tick;
        if let Some(old) = inner.entries.insert(
            key,
            CacheEntry {
                value,
                bytes,
                last_used: tick,
            },
        ) {
            inner.total_bytes -= old.bytes;
        }
        inner.total_bytes += bytes;

        while inner.total_bytes > self.budget {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| *key);
            match oldest {
                Some(key) => {
                    if let Some(evicted) = inner.entries.remove(&key) {
                        inner.total_bytes -= evicted.bytes;
                    }
                }
                None => break,
            }
        }
    }

    /// The current hit/miss counters (zeros unless tracking is enabled).
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap().stats
    }

    /// The number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total accounted bytes currently held.
    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().unwrap().total_bytes
    }
}

/// Accounted size of one cached value: code bytes plus serialized
/// source-map bytes.
fn value_bytes(files: &[CodeResource]) -> u64 {
    files
        .iter()
        .map(|file| {
            file.data.len() as u64
                + file
                    .source_map
                    .as_ref()
                    .map(|map| map.byte_len() as u64)
                    .unwrap_or(0)
        })
        .sum()
}
