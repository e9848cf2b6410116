// SPDX-License-Identifier: AGPL-3.0-only

//! Persistent table cache.
//!
//! One JSON file per cache key holds the full named table set built by a
//! `Structures` construction. Hit detection is an explicit `exists` query
//! followed by a typed load — a missing file, a parse failure, and a
//! partially written set all look the same to the caller (a miss) and
//! trigger a full rebuild. Stores are atomic: write to a temp file in the
//! cache directory, then rename over the key.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CosmicStarError;

/// Directory name used when no cache location is injected.
const DEFAULT_CACHE_DIR: &str = ".cosmicstar";

/// The complete persisted table set for one configuration.
///
/// All five table groups are produced together and cached together; a set
/// missing any entry never deserializes, so partial hits cannot be adopted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTables {
    /// log10-mass grid returned by the cosmology's σ batch (ascending).
    pub km: Vec<f64>,
    /// Comoving length scale per mass grid point.
    pub scale: Vec<f64>,
    /// Redshift grid, descending from zmax to ~0.
    pub zred: Vec<f64>,
    /// σ values co-indexed with `km` (monotonically decreasing).
    pub sg: Vec<f64>,
    /// Cosmic age at each `zred`.
    pub t_z: Vec<f64>,
    /// Critical overdensity δc/D(z) at each `zred`.
    pub d_c2: Vec<f64>,
    /// Comoving dark-matter density at each `zred`.
    pub rdm2: Vec<f64>,
    /// Comoving baryon density at each `zred`.
    pub rbr2: Vec<f64>,
    /// Baryon accretion rate on the `ascale` grid.
    pub abt2: Vec<f64>,
    /// Scale-factor grid, ascending, 1/(1+zmax)..1.
    pub ascale: Vec<f64>,
    /// Second derivatives of the accretion spline (knots are `ascale`,
    /// values are `abt2`).
    pub tck_ab: Vec<f64>,
}

/// Directory-scoped store of [`CachedTables`] keyed by configuration string.
#[derive(Debug, Clone)]
pub struct TableCache {
    dir: PathBuf,
}

impl TableCache {
    /// Open (creating if needed) the cache directory.
    ///
    /// `dir = None` falls back to `$HOME/.cosmicstar` (current directory if
    /// `HOME` is unset).
    ///
    /// # Errors
    ///
    /// [`CosmicStarError::CacheIo`] if the directory cannot be created.
    pub fn open(dir: Option<PathBuf>) -> Result<Self, CosmicStarError> {
        let dir = dir.unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
                .join(DEFAULT_CACHE_DIR)
        });
        if !dir.exists() {
            eprintln!("Creating structures cache directory in {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                CosmicStarError::CacheIo(format!("cannot create {}: {e}", dir.display()))
            })?;
        }
        Ok(Self { dir })
    }

    /// The directory this cache writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// On-disk path for a cache key.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Whether an entry exists for `key` (says nothing about validity).
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    /// Typed load of the full table set; `None` on any miss or corrupt entry.
    #[must_use]
    pub fn load(&self, key: &str) -> Option<CachedTables> {
        let file = fs::File::open(self.path_for(key)).ok()?;
        serde_json::from_reader(BufReader::new(file)).ok()
    }

    /// Persist the full table set under `key`, atomically (temp + rename).
    ///
    /// # Errors
    ///
    /// [`CosmicStarError::CacheIo`] if serialization or the write fails.
    pub fn store(&self, key: &str, tables: &CachedTables) -> Result<(), CosmicStarError> {
        let json = serde_json::to_string(tables)
            .map_err(|e| CosmicStarError::CacheIo(format!("serialize {key}: {e}")))?;
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        let path = self.path_for(key);
        fs::write(&tmp, json)
            .map_err(|e| CosmicStarError::CacheIo(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| CosmicStarError::CacheIo(format!("rename to {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cosmicstar_cache_test_{tag}"));
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn sample_tables() -> CachedTables {
        CachedTables {
            km: vec![4.0, 5.0, 6.0],
            scale: vec![0.1, 0.2, 0.3],
            zred: vec![2.0, 1.0, 0.0],
            sg: vec![3.0, 2.0, 1.0],
            t_z: vec![1.0, 2.0, 3.0],
            d_c2: vec![5.0, 3.4, 1.7],
            rdm2: vec![1e10, 1e10, 1e10],
            rbr2: vec![1e9, 1e9, 1e9],
            abt2: vec![0.0, 0.5, 1.0],
            ascale: vec![0.3, 0.6, 1.0],
            tck_ab: vec![0.0, 0.1, 0.0],
        }
    }

    #[test]
    fn store_then_load_roundtrips_bit_exact() {
        let dir = scratch_dir("roundtrip");
        let cache = TableCache::open(Some(dir.clone())).expect("open cache");
        let tables = sample_tables();
        cache.store("key_a", &tables).expect("store");
        let loaded = cache.load("key_a").expect("load back");
        assert_eq!(tables.sg.len(), loaded.sg.len());
        for (a, b) in tables.sg.iter().zip(&loaded.sg) {
            assert_eq!(a.to_bits(), b.to_bits(), "sg not bit-identical");
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn awkward_floats_roundtrip_bit_exact() {
        let dir = scratch_dir("floats");
        let cache = TableCache::open(Some(dir.clone())).expect("open cache");
        let mut tables = sample_tables();
        // Values with long decimal expansions, where a shortest-repr parse
        // that is not exact would drift by ULPs.
        tables.sg = vec![
            0.1 + 0.2,
            1.0 / 3.0,
            std::f64::consts::PI,
            2.76e+11 * 0.24 * 0.49,
            1.0e-308,
            (-0.707f64 * 4.973).exp(),
        ];
        cache.store("floats", &tables).expect("store");
        let loaded = cache.load("floats").expect("load back");
        for (a, b) in tables.sg.iter().zip(&loaded.sg) {
            assert_eq!(a.to_bits(), b.to_bits(), "{a} drifted to {b}");
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_key_is_a_miss() {
        let dir = scratch_dir("missing");
        let cache = TableCache::open(Some(dir.clone())).expect("open cache");
        assert!(!cache.exists("nope"));
        assert!(cache.load("nope").is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_entry_is_a_miss_not_an_error() {
        let dir = scratch_dir("corrupt");
        let cache = TableCache::open(Some(dir.clone())).expect("open cache");
        fs::write(cache.path_for("bad"), "{broken json").expect("write corrupt file");
        assert!(cache.exists("bad"));
        assert!(cache.load("bad").is_none(), "corrupt entry must read as miss");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn partial_set_is_a_miss() {
        let dir = scratch_dir("partial");
        let cache = TableCache::open(Some(dir.clone())).expect("open cache");
        // A set missing required entries must not deserialize.
        fs::write(cache.path_for("part"), r#"{"km": [1.0], "sg": [2.0]}"#)
            .expect("write partial file");
        assert!(cache.load("part").is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn uncreatable_directory_errors() {
        let result = TableCache::open(Some(PathBuf::from("/proc/no_such/cosmicstar")));
        assert!(matches!(result, Err(CosmicStarError::CacheIo(_))));
    }
}
