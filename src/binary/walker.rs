//! Bit-by-bit trie descent.
//!
//! IPv4 space lives under a fixed 96-bit prefix (80 zero bits, then 16 one
//! bits) of the dual-stack trie. The node at the end of that prefix is
//! resolved once per reader and every IPv4 lookup descends 32 bits from it.
//! IPv6 lookups resume from the node cached for their first 16 bits when
//! one is known.

use std::net::IpAddr;

use super::cache::OffsetCache;
use super::format::{bit_at, v4_prefix_bit, Pointer, V4_PREFIX_BITS, V6_CACHE_BITS};
use super::trie::TrieIndex;
use crate::error::LookupError;
use crate::metadata::IpVersion;

/// Drives descent for one lookup.
pub struct AddressBitWalker<'a> {
    trie: TrieIndex<'a>,
    cache: &'a OffsetCache,
    versions: IpVersion,
}

impl<'a> AddressBitWalker<'a> {
    pub fn new(trie: TrieIndex<'a>, cache: &'a OffsetCache, versions: IpVersion) -> Self {
        Self {
            trie,
            cache,
            versions,
        }
    }

    /// Leaf pointer for `ip`, or `None` when the address has no record.
    ///
    /// IPv4-mapped IPv6 addresses must already be converted to IPv4.
    pub fn find_leaf(&self, ip: IpAddr) -> Result<Option<u32>, LookupError> {
        match ip {
            IpAddr::V4(v4) => match self.v4_root()? {
                Some(root) => self.descend(&v4.octets(), root, 0, None),
                None => Ok(None),
            },
            IpAddr::V6(v6) => {
                let bytes = v6.octets();
                let prefix = [bytes[0], bytes[1]];
                match self.cache.v6_node(prefix) {
                    Some(node) => self.descend(&bytes, node, V6_CACHE_BITS, None),
                    None => self.descend(&bytes, 0, 0, Some(prefix)),
                }
            }
        }
    }

    fn v4_root(&self) -> Result<Option<u32>, LookupError> {
        self.cache.v4_root_or_try_init(|| self.resolve_v4_root())
    }

    /// Walk the IPv4 prefix path from the root.
    ///
    /// A v4-only file without the embedded prefix is a flat 32-bit trie
    /// rooted at node 0.
    fn resolve_v4_root(&self) -> Result<Option<u32>, LookupError> {
        let node_count = self.trie.node_count();
        let mut node = 0;
        for i in 0..V4_PREFIX_BITS {
            if node >= node_count {
                break;
            }
            node = self.trie.read_child(node, v4_prefix_bit(i))?;
        }

        if node < node_count {
            log::debug!("IPv4 sub-trie rooted at node {}", node);
            return Ok(Some(node));
        }

        if self.versions.contains(IpVersion::V6) {
            log::warn!("Dual-stack database has no IPv4 prefix path; IPv4 lookups will miss");
            Ok(None)
        } else {
            log::debug!("No IPv4 prefix path in v4-only database, using flat layout");
            Ok(Some(0))
        }
    }

    fn descend(
        &self,
        bytes: &[u8],
        start_node: u32,
        start_bit: usize,
        prefix: Option<[u8; 2]>,
    ) -> Result<Option<u32>, LookupError> {
        let node_count = self.trie.node_count();
        let mut node = start_node;

        for i in start_bit..bytes.len() * 8 {
            if node >= node_count {
                break;
            }
            node = self.trie.read_child(node, bit_at(bytes, i))?;
            if i == V6_CACHE_BITS - 1 {
                if let Some(prefix) = prefix {
                    self.cache.insert_v6(prefix, node);
                }
            }
        }

        match Pointer::classify(node, node_count) {
            Pointer::Empty => Ok(None),
            Pointer::Leaf(leaf) => Ok(Some(leaf)),
            Pointer::Node(node) => Err(LookupError::TrieTraversalFailure { node }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::view::ByteView;

    fn table(nodes: &[[u32; 2]]) -> Vec<u8> {
        nodes
            .iter()
            .flat_map(|n| n.iter().flat_map(|c| c.to_be_bytes()))
            .collect()
    }

    /// Flat v4 trie: 0.0.0.0/1 -> leaf 3, 128.0.0.0/2 -> leaf 4, rest empty.
    fn flat_v4() -> Vec<u8> {
        table(&[[3, 1], [4, 2]])
    }

    #[test]
    fn test_flat_v4_layout() {
        let data = flat_v4();
        let cache = OffsetCache::new();
        let walker = AddressBitWalker::new(
            TrieIndex::new(ByteView::new(&data, 0), 2),
            &cache,
            IpVersion::V4,
        );

        assert_eq!(walker.find_leaf("1.2.3.4".parse().unwrap()), Ok(Some(3)));
        assert_eq!(walker.find_leaf("130.0.0.1".parse().unwrap()), Ok(Some(4)));
        assert_eq!(walker.find_leaf("192.0.0.1".parse().unwrap()), Ok(None));
        assert_eq!(cache.stats().v4_root, Some(0));
    }

    #[test]
    fn test_dual_stack_without_v4_prefix() {
        // node 0: both children are dead ends
        let data = table(&[[1, 1]]);
        let cache = OffsetCache::new();
        let walker = AddressBitWalker::new(
            TrieIndex::new(ByteView::new(&data, 0), 1),
            &cache,
            IpVersion::V4 | IpVersion::V6,
        );

        assert_eq!(walker.find_leaf("8.8.8.8".parse().unwrap()), Ok(None));
        assert_eq!(cache.stats().v4_root, None);
    }

    #[test]
    fn test_exhausted_descent_is_failure() {
        // node 0 loops onto itself and never reaches a terminal
        let data = table(&[[0, 0]]);
        let cache = OffsetCache::new();
        let walker = AddressBitWalker::new(
            TrieIndex::new(ByteView::new(&data, 0), 1),
            &cache,
            IpVersion::V6,
        );

        assert_eq!(
            walker.find_leaf("2001:db8::1".parse().unwrap()),
            Err(LookupError::TrieTraversalFailure { node: 0 })
        );
    }

    #[test]
    fn test_empty_trie_is_not_found() {
        let cache = OffsetCache::new();
        let walker =
            AddressBitWalker::new(TrieIndex::new(ByteView::new(&[], 0), 0), &cache, IpVersion::V4);

        assert_eq!(walker.find_leaf("1.1.1.1".parse().unwrap()), Ok(None));
    }
}
