// src/core/cache.rs
//
// Persistent feature cache keyed by canonical path, byte size and mtime.
// Shared by classification workers behind a single mutex.

use super::analysis::FeatureVector;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::UNIX_EPOCH;

pub const CACHE_FILE_NAME: &str = "feature_cache.json";

/// Counters reported with every run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Vectors served from the cache instead of being recomputed
    pub reused: usize,
    pub computed: usize,
    pub saved_entries: usize,
    pub persisted: bool,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, FeatureVector>,
    stats: CacheStats,
}

pub struct FeatureCache {
    path: PathBuf,
    state: Mutex<CacheState>,
}

impl FeatureCache {
    /// Empty cache that would persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Load `<hub>/feature_cache.json`; a missing or corrupt file yields an
    /// empty cache.
    pub fn load(hub: &Path) -> Self {
        let cache = Self::new(hub.join(CACHE_FILE_NAME));
        if !cache.path.is_file() {
            return cache;
        }

        let parsed = fs::read_to_string(&cache.path)
            .map_err(crate::Error::from)
            .and_then(|text| {
                serde_json::from_str::<HashMap<String, FeatureVector>>(&text).map_err(crate::Error::from)
            });

        match parsed {
            Ok(entries) => {
                debug!("Loaded {} cached feature vectors", entries.len());
                cache.lock().entries = entries;
            }
            Err(e) => warn!("Discarding unreadable feature cache {}: {}", cache.path.display(), e),
        }
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // a panicked worker leaves the map intact; keep using it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// `"<canonical path>|<size>|<mtime seconds>"`, or the plain path when
    /// the file cannot be stat'ed
    pub fn cache_key(path: &Path) -> String {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        match fs::metadata(&canonical) {
            Ok(meta) => {
                let mtime = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);
                format!("{}|{}|{}", canonical.display(), meta.len(), mtime)
            }
            Err(_) => canonical.display().to_string(),
        }
    }

    /// Read-through lookup. `compute` runs outside the lock; when two
    /// workers race on one key the first stored vector wins.
    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> FeatureVector
    where
        F: FnOnce() -> FeatureVector,
    {
        {
            let mut state = self.lock();
            if let Some(found) = state.entries.get(key).cloned() {
                state.stats.hits += 1;
                state.stats.reused += 1;
                debug!("Feature cache hit: {}", key);
                return found;
            }
            state.stats.misses += 1;
        }

        let computed = compute();

        let mut state = self.lock();
        state.stats.computed += 1;
        state.entries.entry(key.to_string()).or_insert(computed).clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats.clone()
    }

    /// Zero the per-run counters
    pub fn reset_run_stats(&self) {
        self.lock().stats = CacheStats::default();
    }

    /// Overwrite the on-disk cache with every in-memory entry
    pub fn save(&self) -> crate::Result<usize> {
        let mut state = self.lock();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(writer, &state.entries)?;

        let saved = state.entries.len();
        state.stats.saved_entries = saved;
        state.stats.persisted = true;
        debug!("Persisted {} feature vectors to {}", saved, self.path.display());
        Ok(saved)
    }
}
