//! Database metadata header.
//!
//! Every database starts with a 4-byte big-endian length followed by a
//! UTF-8 JSON object of that length describing the rest of the file.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::binary::{META_LENGTH_SIZE, NODE_SIZE};
use crate::error::LoadError;

bitflags! {
    /// IP versions a database can answer for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IpVersion: u16 {
        /// IPv4 addresses
        const V4 = 0b01;
        /// IPv6 addresses
        const V6 = 0b10;
    }
}

/// Decoded metadata header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Build time as UNIX seconds
    pub build: u64,
    /// Raw `ip_version` bitmask, see [`Metadata::ip_version`]
    pub ip_version: u16,
    /// Language code to the first field index of its window
    pub languages: BTreeMap<String, usize>,
    /// Number of trie nodes in the node table
    pub node_count: u32,
    /// Size of node table plus data section
    pub total_size: usize,
    /// Field names, shared by every language
    pub fields: Vec<String>,
}

/// Header as it appears on disk; every key is optional so absent keys
/// are reported as metadata errors rather than JSON errors.
#[derive(Debug, Deserialize)]
struct RawMetadata {
    build: Option<u64>,
    ip_version: Option<u16>,
    languages: Option<BTreeMap<String, usize>>,
    node_count: Option<u32>,
    total_size: Option<u64>,
    fields: Option<Vec<String>>,
}

impl Metadata {
    /// Parse the metadata header at the start of `buffer` and validate it
    /// against the buffer length.
    ///
    /// Returns the metadata and the absolute offset of the node table.
    pub fn parse(buffer: &[u8]) -> Result<(Self, usize), LoadError> {
        let prefix: [u8; META_LENGTH_SIZE] = buffer
            .get(..META_LENGTH_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(LoadError::SizeMismatch {
                expected: META_LENGTH_SIZE,
                actual: buffer.len(),
            })?;
        let meta_len = u32::from_be_bytes(prefix) as usize;
        let node_table_start = META_LENGTH_SIZE + meta_len;

        let text = buffer
            .get(META_LENGTH_SIZE..node_table_start)
            .ok_or(LoadError::SizeMismatch {
                expected: node_table_start,
                actual: buffer.len(),
            })?;

        let raw: RawMetadata = serde_json::from_slice(text)
            .map_err(|e| LoadError::InvalidMetadata(e.to_string()))?;
        let metadata = Self::from_raw(raw)?;

        let expected = node_table_start
            .checked_add(metadata.total_size)
            .ok_or(LoadError::SizeMismatch {
                expected: usize::MAX,
                actual: buffer.len(),
            })?;
        if expected != buffer.len() {
            return Err(LoadError::SizeMismatch {
                expected,
                actual: buffer.len(),
            });
        }

        Ok((metadata, node_table_start))
    }

    fn from_raw(raw: RawMetadata) -> Result<Self, LoadError> {
        let missing = |key: &str| LoadError::InvalidMetadata(format!("missing `{}`", key));

        let fields = raw.fields.ok_or_else(|| missing("fields"))?;
        let languages = raw.languages.ok_or_else(|| missing("languages"))?;
        let node_count = raw.node_count.ok_or_else(|| missing("node_count"))?;
        let ip_version = raw.ip_version.ok_or_else(|| missing("ip_version"))?;
        let total_size = raw.total_size.ok_or_else(|| missing("total_size"))?;
        let total_size = usize::try_from(total_size)
            .map_err(|_| LoadError::InvalidMetadata(format!("total_size {} too large", total_size)))?;

        if let Some((language, start)) = languages
            .iter()
            .find(|(_, start)| start.checked_add(fields.len()).is_none())
        {
            return Err(LoadError::InvalidMetadata(format!(
                "language {} starts at field {}, past the end of any record",
                language, start
            )));
        }

        let node_table_size = node_count as usize * NODE_SIZE;
        if node_table_size > total_size {
            return Err(LoadError::InvalidMetadata(format!(
                "node table ({} bytes) larger than total_size ({})",
                node_table_size, total_size
            )));
        }

        Ok(Self {
            build: raw.build.unwrap_or_default(),
            ip_version,
            languages,
            node_count,
            total_size,
            fields,
        })
    }

    /// Supported IP versions. Unknown bits are ignored.
    pub fn ip_version(&self) -> IpVersion {
        IpVersion::from_bits_truncate(self.ip_version)
    }

    /// Whether IPv4 lookups are supported.
    pub fn supports_v4(&self) -> bool {
        self.ip_version().contains(IpVersion::V4)
    }

    /// Whether IPv6 lookups are supported.
    pub fn supports_v6(&self) -> bool {
        self.ip_version().contains(IpVersion::V6)
    }

    /// Build time of the database.
    pub fn build_time(&self) -> SystemTime {
        UNIX_EPOCH
            .checked_add(Duration::from_secs(self.build))
            .unwrap_or(UNIX_EPOCH)
    }

    /// Field index range of `language` within a record, if supported.
    pub fn language_window(&self, language: &str) -> Option<std::ops::Range<usize>> {
        let start = *self.languages.get(language)?;
        Some(start..start.checked_add(self.fields.len())?)
    }
}
