//! Record decoding from the data section.

use std::ops::Range;

use super::format::{data_offset, FIELD_SEPARATOR, RECORD_LENGTH_SIZE};
use super::view::ByteView;
use crate::error::LookupError;

/// Resolves leaf pointers to record payloads.
#[derive(Debug, Clone, Copy)]
pub struct RecordResolver<'a> {
    view: ByteView<'a>,
    node_count: u32,
}

/// One decoded record: tab-separated values for every language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    offset: usize,
    text: &'a str,
}

impl<'a> RecordResolver<'a> {
    pub fn new(view: ByteView<'a>, node_count: u32) -> Self {
        Self { view, node_count }
    }

    /// Read the record a leaf pointer refers to.
    pub fn resolve(&self, leaf: u32) -> Result<Record<'a>, LookupError> {
        debug_assert!(leaf > self.node_count);
        let offset = data_offset(leaf, self.node_count);
        if offset >= self.view.len() {
            return Err(LookupError::RecordOutOfBounds { offset });
        }

        let out_of_bounds = LookupError::RecordOutOfBounds { offset };
        let len = self.view.read_u16(offset).ok_or_else(|| out_of_bounds.clone())?;
        let payload = self
            .view
            .slice(offset + RECORD_LENGTH_SIZE, len as usize)
            .ok_or(out_of_bounds)?;

        let text = std::str::from_utf8(payload).map_err(|e| LookupError::MalformedRecord {
            offset,
            reason: e.to_string(),
        })?;

        Ok(Record { offset, text })
    }
}

impl<'a> Record<'a> {
    /// Offset of the record relative to the node table start.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Raw payload text.
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Every value in the record, all languages in file order.
    pub fn values(&self) -> Vec<&'a str> {
        self.text.split(FIELD_SEPARATOR).collect()
    }

    /// Values belonging to one language window.
    pub fn window(&self, range: Range<usize>) -> Result<Vec<String>, LookupError> {
        let values = self.values();
        values
            .get(range.clone())
            .map(|window| window.iter().map(|v| (*v).to_string()).collect())
            .ok_or_else(|| LookupError::MalformedRecord {
                offset: self.offset,
                reason: format!(
                    "{} values, language window needs {}..{}",
                    values.len(),
                    range.start,
                    range.end
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One node (8 bytes) followed by a data section.
    fn with_data(data: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; 8];
        buf.extend_from_slice(data);
        buf
    }

    fn record(text: &str) -> Vec<u8> {
        let mut buf = (text.len() as u16).to_be_bytes().to_vec();
        buf.extend_from_slice(text.as_bytes());
        buf
    }

    #[test]
    fn test_resolve_record() {
        let mut data = vec![0u8];
        data.extend(record("中国\t北京\tChina\tBeijing"));
        let buf = with_data(&data);
        let resolver = RecordResolver::new(ByteView::new(&buf, 0), 1);

        // leaf 2 -> data offset 1 + 8
        let rec = resolver.resolve(2).unwrap();
        assert_eq!(rec.offset(), 9);
        assert_eq!(rec.values(), vec!["中国", "北京", "China", "Beijing"]);
        assert_eq!(rec.window(2..4).unwrap(), vec!["China", "Beijing"]);
    }

    #[test]
    fn test_empty_values_are_kept() {
        let buf = with_data(&[&[0u8][..], &record("a\t\tc")[..]].concat());
        let rec = RecordResolver::new(ByteView::new(&buf, 0), 1).resolve(2).unwrap();
        assert_eq!(rec.values(), vec!["a", "", "c"]);
    }

    #[test]
    fn test_offset_past_data_section() {
        let buf = with_data(&record("x"));
        let resolver = RecordResolver::new(ByteView::new(&buf, 0), 1);

        assert_eq!(
            resolver.resolve(100),
            Err(LookupError::RecordOutOfBounds { offset: 107 })
        );
    }

    #[test]
    fn test_payload_runs_past_end() {
        let mut data = vec![0u8];
        data.extend_from_slice(&[0x00, 0x10, b'a', b'b']);
        let buf = with_data(&data);
        let resolver = RecordResolver::new(ByteView::new(&buf, 0), 1);

        assert_eq!(
            resolver.resolve(2),
            Err(LookupError::RecordOutOfBounds { offset: 9 })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let buf = with_data(&[0x00, 0x00, 0x02, 0xFF, 0xFE]);
        let resolver = RecordResolver::new(ByteView::new(&buf, 0), 1);

        assert!(matches!(
            resolver.resolve(2),
            Err(LookupError::MalformedRecord { offset: 9, .. })
        ));
    }

    #[test]
    fn test_window_too_short() {
        let buf = with_data(&[&[0u8][..], &record("a\tb")[..]].concat());
        let rec = RecordResolver::new(ByteView::new(&buf, 0), 1).resolve(2).unwrap();
        assert!(matches!(
            rec.window(2..4),
            Err(LookupError::MalformedRecord { .. })
        ));
    }
}
