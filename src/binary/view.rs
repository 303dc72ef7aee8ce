//! Bounds-checked big-endian reads over the loaded database.

/// Read accessor whose offsets are relative to the node table start.
///
/// Every read returns `None` instead of panicking when it would leave
/// the buffer.
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a> {
    buffer: &'a [u8],
    origin: usize,
}

impl<'a> ByteView<'a> {
    /// Create a view over `buffer` with offset 0 at `origin`.
    pub fn new(buffer: &'a [u8], origin: usize) -> Self {
        Self { buffer, origin }
    }

    /// Bytes available from the origin to the end of the buffer.
    pub fn len(&self) -> usize {
        self.buffer.len().saturating_sub(self.origin)
    }

    /// Whether nothing follows the origin.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `len` bytes starting at `offset`.
    #[inline]
    pub fn slice(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let start = self.origin.checked_add(offset)?;
        let end = start.checked_add(len)?;
        self.buffer.get(start..end)
    }

    /// Big-endian `u32` at `offset`.
    #[inline]
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.slice(offset, 4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Big-endian `u16` at `offset`.
    #[inline]
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.slice(offset, 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}
