//! Per-reader memoization of the top of the trie.
//!
//! Both caches only ever hold values derived from the immutable file;
//! racing writers store the same value.

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::LookupError;

/// Lazily filled trie offsets owned by one reader.
#[derive(Debug, Default)]
pub struct OffsetCache {
    /// Root of the IPv4 sub-trie; `Some(None)` once the file is known to
    /// have no IPv4 space.
    v4_root: OnceCell<Option<u32>>,
    /// First two address bytes to the node reached after 16 bits.
    v6_prefixes: RwLock<AHashMap<[u8; 2], u32>>,
    v6_hits: AtomicU64,
}

/// Snapshot of cache contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCacheStats {
    /// Cached IPv4 root, if resolved and present
    pub v4_root: Option<u32>,
    /// Number of cached v6 prefixes
    pub v6_entries: usize,
    /// Lookups that resumed from a cached v6 prefix
    pub v6_hits: u64,
}

impl OffsetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// IPv4 root, computing it with `init` on first use.
    ///
    /// Errors from `init` are returned and not cached.
    pub fn v4_root_or_try_init<F>(&self, init: F) -> Result<Option<u32>, LookupError>
    where
        F: FnOnce() -> Result<Option<u32>, LookupError>,
    {
        self.v4_root.get_or_try_init(init).copied()
    }

    /// Cached node for a v6 prefix.
    pub fn v6_node(&self, prefix: [u8; 2]) -> Option<u32> {
        let node = self.v6_prefixes.read().get(&prefix).copied();
        if node.is_some() {
            self.v6_hits.fetch_add(1, Ordering::Relaxed);
        }
        node
    }

    /// Record the node reached after the first 16 bits of a v6 address.
    pub fn insert_v6(&self, prefix: [u8; 2], node: u32) {
        if self.v6_prefixes.read().contains_key(&prefix) {
            return;
        }
        self.v6_prefixes.write().entry(prefix).or_insert(node);
        log::trace!("Cached v6 prefix {:02x}{:02x} -> node {}", prefix[0], prefix[1], node);
    }

    /// Current cache contents.
    pub fn stats(&self) -> OffsetCacheStats {
        OffsetCacheStats {
            v4_root: self.v4_root.get().copied().flatten(),
            v6_entries: self.v6_prefixes.read().len(),
            v6_hits: self.v6_hits.load(Ordering::Relaxed),
        }
    }
}
