use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use super::model::Series;

// ---------------------------------------------------------------------------
// Series cache
// ---------------------------------------------------------------------------

/// Identity of a file's contents: byte length plus SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub len: u64,
    pub digest: Vec<u8>,
}

impl Fingerprint {
    pub fn of(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Fingerprint {
            len: bytes.len() as u64,
            digest: Sha256::digest(&bytes).to_vec(),
        })
    }
}

/// What a cached entry was derived from: the loader, the target country
/// and the source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: &'static str,
    country: String,
    path: PathBuf,
}

#[derive(Debug, Clone)]
struct Entry {
    fingerprint: Fingerprint,
    series: Arc<[Series]>,
}

/// Memoised tidy series keyed by (loader, country, file path).
///
/// An entry is reused only while the file's content fingerprint is
/// unchanged. Cached series are shared read-only; callers derive their own
/// copies.
#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: HashMap<CacheKey, Entry>,
    hits: usize,
    misses: usize,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached series for `path` as loaded for `country`, or run
    /// `load` and remember its output. Errors are not cached.
    pub fn get_or_load<F>(
        &mut self,
        kind: &'static str,
        country: &str,
        path: &Path,
        load: F,
    ) -> Result<Arc<[Series]>>
    where
        F: FnOnce(&Path) -> Result<Vec<Series>>,
    {
        let fingerprint = Fingerprint::of(path)?;
        let key = CacheKey {
            kind,
            country: country.to_string(),
            path: path.to_path_buf(),
        };

        if let Some(entry) = self.entries.get(&key) {
            if entry.fingerprint == fingerprint {
                self.hits += 1;
                log::debug!("cache hit: {kind} ({country}) {}", path.display());
                return Ok(Arc::clone(&entry.series));
            }
            log::info!("{} changed on disk, reloading", path.display());
        }

        self.misses += 1;
        let series: Arc<[Series]> = load(path)?.into();
        self.entries.insert(
            key,
            Entry {
                fingerprint,
                series: Arc::clone(&series),
            },
        );
        Ok(series)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        log::info!("clearing {} cached source(s)", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
