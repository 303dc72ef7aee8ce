//! Node table access.

use super::format::{CHILD_SIZE, NODE_SIZE};
use super::view::ByteView;
use crate::error::LookupError;

/// Decodes child pointers out of the node table.
#[derive(Debug, Clone, Copy)]
pub struct TrieIndex<'a> {
    view: ByteView<'a>,
    node_count: u32,
}

impl<'a> TrieIndex<'a> {
    pub fn new(view: ByteView<'a>, node_count: u32) -> Self {
        Self { view, node_count }
    }

    /// Number of nodes in the trie.
    #[inline]
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Child pointer of `node` selected by `bit`.
    ///
    /// The caller guarantees `node < node_count`; a read outside the
    /// buffer means the file is corrupt.
    #[inline]
    pub fn read_child(&self, node: u32, bit: u8) -> Result<u32, LookupError> {
        let offset = node as usize * NODE_SIZE + bit as usize * CHILD_SIZE;
        self.view
            .read_u32(offset)
            .ok_or(LookupError::TrieTraversalFailure { node })
    }
}
