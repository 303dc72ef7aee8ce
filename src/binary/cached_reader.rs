//! Cached reader with hot reload support.
//!
//! This module provides a lookup front end with:
//! - LRU cache for lookup results
//! - Atomic hot reload for swapping in a new database without downtime
//! - Thread-safe concurrent access

use arc_swap::ArcSwap;
use quick_cache::sync::Cache;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::reader::{parse_ip, Reader};
use crate::config::ReaderConfig;
use crate::error::{LoadError, LookupError};

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Cache key: reader generation, address and language.
///
/// Entries from before a reload carry an old generation and are never hit
/// again, even if a lookup that started before the reload stores late.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    generation: u64,
    ip: IpAddr,
    language: String,
}

/// A reader together with the generation it was installed under.
///
/// Lookups take one snapshot and use it for the cache key, the descent and
/// the field names.
struct Snapshot {
    reader: Arc<Reader>,
    generation: u64,
}

/// Configuration for the cached reader.
#[derive(Debug, Clone)]
pub struct CachedReaderConfig {
    /// Maximum number of entries in the cache.
    pub cache_capacity: usize,
    /// Whether to enable caching.
    pub cache_enabled: bool,
    /// How databases are opened, initially and on reload.
    pub reader: ReaderConfig,
}

impl Default for CachedReaderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_enabled: true,
            reader: ReaderConfig::default(),
        }
    }
}

impl CachedReaderConfig {
    /// Create a new configuration with the specified cache capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache_capacity: capacity,
            ..Self::default()
        }
    }

    /// Create a configuration with caching disabled.
    pub fn no_cache() -> Self {
        Self {
            cache_capacity: 0,
            cache_enabled: false,
            ..Self::default()
        }
    }
}

/// Cached reader with hot reload support.
///
/// This reader wraps [`Reader`] and adds:
/// - LRU cache for lookup results to avoid repeated descents
/// - Atomic hot reload to replace the database without service interruption
///
/// Only successful lookups are cached, including "not found". Input is
/// validated in the same order as [`Reader::lookup`].
///
/// # Example
///
/// ```ignore
/// use ipdb::CachedReader;
///
/// let reader = CachedReader::open("ipipfree.ipdb")?;
/// let fields = reader.lookup("139.228.209.62", "CN")?;
///
/// // Hot reload a newer build
/// reader.reload("ipipfree-new.ipdb")?;
/// ```
pub struct CachedReader {
    /// Current reader and its generation, swapped atomically on reload.
    inner: ArcSwap<Snapshot>,
    /// LRU cache for lookup results.
    cache: Option<Cache<CacheKey, Option<Vec<String>>>>,
    /// Configuration.
    config: CachedReaderConfig,
    /// Last generation handed out.
    last_generation: AtomicU64,
}

impl CachedReader {
    /// Open a database file with default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::open_with_config(path, CachedReaderConfig::default())
    }

    /// Open a database file with custom configuration.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: CachedReaderConfig,
    ) -> Result<Self, LoadError> {
        let reader = Reader::open_with_config(path, &config.reader)?;
        Ok(Self::from_reader(reader, config))
    }

    /// Create from bytes with default configuration.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        Self::from_bytes_with_config(data, CachedReaderConfig::default())
    }

    /// Create from bytes with custom configuration.
    pub fn from_bytes_with_config(
        data: Vec<u8>,
        config: CachedReaderConfig,
    ) -> Result<Self, LoadError> {
        Ok(Self::from_reader(Reader::from_bytes(data)?, config))
    }

    /// Wrap an existing reader.
    pub fn from_reader(reader: Reader, config: CachedReaderConfig) -> Self {
        let cache = if config.cache_enabled && config.cache_capacity > 0 {
            Some(Cache::new(config.cache_capacity))
        } else {
            None
        };

        Self {
            inner: ArcSwap::from_pointee(Snapshot {
                reader: Arc::new(reader),
                generation: 0,
            }),
            cache,
            config,
            last_generation: AtomicU64::new(0),
        }
    }

    /// Hot reload the database from a file.
    ///
    /// This atomically replaces the underlying reader and clears the cache.
    /// In-flight lookups complete against the old database, new lookups
    /// use the new one.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        let reader = Reader::open_with_config(path, &self.config.reader)?;
        self.swap(reader);
        log::info!("Hot reloaded database from {:?}", path);
        Ok(())
    }

    /// Hot reload the database from bytes.
    pub fn reload_from_bytes(&self, data: Vec<u8>) -> Result<(), LoadError> {
        let reader = Reader::from_bytes(data)?;
        self.swap(reader);
        log::info!("Hot reloaded database from bytes");
        Ok(())
    }

    fn swap(&self, reader: Reader) {
        let generation = self.last_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.store(Arc::new(Snapshot {
            reader: Arc::new(reader),
            generation,
        }));
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    /// Look up an address string with caching.
    pub fn lookup(&self, ip: &str, language: &str) -> Result<Option<Vec<String>>, LookupError> {
        let snapshot = self.inner.load();
        snapshot.reader.language_window(language)?;
        let addr = parse_ip(ip)?;
        self.cached_lookup(&snapshot, addr, language)
    }

    /// Look up a parsed address with caching.
    pub fn lookup_addr(
        &self,
        ip: IpAddr,
        language: &str,
    ) -> Result<Option<Vec<String>>, LookupError> {
        let snapshot = self.inner.load();
        self.cached_lookup(&snapshot, ip, language)
    }

    /// Look up an address string, keyed by field name.
    ///
    /// Values and field names always come from the same database, even
    /// when a reload runs concurrently.
    pub fn lookup_map(
        &self,
        ip: &str,
        language: &str,
    ) -> Result<Option<HashMap<String, String>>, LookupError> {
        let snapshot = self.inner.load();
        snapshot.reader.language_window(language)?;
        let addr = parse_ip(ip)?;
        let values = self.cached_lookup(&snapshot, addr, language)?;
        Ok(values.map(|values| snapshot.reader.fields().iter().cloned().zip(values).collect()))
    }

    fn cached_lookup(
        &self,
        snapshot: &Snapshot,
        ip: IpAddr,
        language: &str,
    ) -> Result<Option<Vec<String>>, LookupError> {
        let key = CacheKey {
            generation: snapshot.generation,
            ip,
            language: language.to_string(),
        };

        // Check cache first
        if let Some(ref cache) = self.cache {
            if let Some(result) = cache.get(&key) {
                return Ok(result);
            }
        }

        // Cache miss - perform lookup
        let result = snapshot.reader.lookup_addr(ip, language)?;

        // Store in cache
        if let Some(ref cache) = self.cache {
            cache.insert(key, result.clone());
        }

        Ok(result)
    }

    /// Clear the cache.
    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        if let Some(ref cache) = self.cache {
            CacheStats {
                capacity: self.config.cache_capacity,
                len: cache.len(),
                enabled: true,
            }
        } else {
            CacheStats {
                capacity: 0,
                len: 0,
                enabled: false,
            }
        }
    }

    /// Get the generation of the current reader (incremented on each reload).
    pub fn generation(&self) -> u64 {
        self.inner.load().generation
    }

    /// Get the current underlying reader.
    ///
    /// Note: The returned reader may become stale after a hot reload.
    pub fn inner(&self) -> Arc<Reader> {
        Arc::clone(&self.inner.load().reader)
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Maximum cache capacity.
    pub capacity: usize,
    /// Current number of entries in the cache.
    pub len: usize,
    /// Whether caching is enabled.
    pub enabled: bool,
}
