//! Binary format constants and pointer decoding.

/// Size of the big-endian metadata length prefix.
pub const META_LENGTH_SIZE: usize = 4;

/// Size of one trie node (two child pointers).
pub const NODE_SIZE: usize = 8;

/// Size of one child pointer.
pub const CHILD_SIZE: usize = 4;

/// Size of the big-endian record length prefix.
pub const RECORD_LENGTH_SIZE: usize = 2;

/// Separator between field values in a record payload.
pub const FIELD_SEPARATOR: char = '\t';

/// Number of bits routing IPv4 space inside a dual-stack trie.
pub const V4_PREFIX_BITS: usize = 96;

/// Leading bits of the IPv4 prefix that select child 0; the rest select child 1.
pub const V4_PREFIX_ZERO_BITS: usize = 80;

/// Address bits covered by one v6 offset cache entry.
pub const V6_CACHE_BITS: usize = 16;

/// Decoded child pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    /// Internal node, descent continues
    Node(u32),
    /// Dead end, no record for the address
    Empty,
    /// Leaf holding the raw pointer value
    Leaf(u32),
}

impl Pointer {
    /// Classify a raw child pointer against the node count.
    #[inline]
    pub fn classify(value: u32, node_count: u32) -> Self {
        use std::cmp::Ordering;
        match value.cmp(&node_count) {
            Ordering::Less => Pointer::Node(value),
            Ordering::Equal => Pointer::Empty,
            Ordering::Greater => Pointer::Leaf(value),
        }
    }
}

/// Offset of a leaf's record, relative to the node table start.
#[inline]
pub fn data_offset(leaf: u32, node_count: u32) -> usize {
    (leaf - node_count) as usize + node_count as usize * NODE_SIZE
}

/// Bit `index` of `bytes`, most significant bit first.
#[inline]
pub fn bit_at(bytes: &[u8], index: usize) -> u8 {
    (bytes[index >> 3] >> (7 - (index & 7))) & 1
}

/// Child selected at step `index` of the implicit IPv4 prefix path.
#[inline]
pub fn v4_prefix_bit(index: usize) -> u8 {
    u8::from(index >= V4_PREFIX_ZERO_BITS)
}
