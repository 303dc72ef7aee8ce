//! IPDB binary format: a metadata header followed by a binary trie over
//! address bits and a data section of tab-separated records.
//!
//! # File Structure
//!
//! ```text
//! +------------------+
//! |  META LENGTH     |  4 bytes, u32 big-endian
//! +------------------+
//! |  METADATA        |  JSON, META LENGTH bytes
//! +------------------+
//! |  NODE TABLE      |  node_count * 8 bytes: {child0: u32, child1: u32}
//! +------------------+
//! |  DATA SECTION    |  records: {len: u16, payload: len bytes UTF-8}
//! +------------------+
//! ```
//!
//! A child pointer below `node_count` is another node, equal to it is a
//! dead end, and above it is a leaf whose record lives at
//! `(pointer - node_count) + node_count * 8` bytes past the node table start.

mod cache;
mod cached_reader;
mod database;
mod format;
mod reader;
mod record;
mod trie;
mod view;
mod walker;

#[cfg(test)]
#[path = "../../tests/common/mod.rs"]
pub(crate) mod fixture;


pub use cache::{OffsetCache, OffsetCacheStats};
pub use cached_reader::{CacheStats, CachedReader, CachedReaderConfig};
pub use database::Database;
pub use format::*;
pub use reader::Reader;
pub use record::{Record, RecordResolver};
pub use trie::TrieIndex;
pub use view::ByteView;
pub use walker::AddressBitWalker;
