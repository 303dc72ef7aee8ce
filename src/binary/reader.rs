//! Database reader: input validation and lookup orchestration.

use std::collections::HashMap;
use std::net::IpAddr;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use super::cache::{OffsetCache, OffsetCacheStats};
use super::database::Database;
use super::record::RecordResolver;
use super::trie::TrieIndex;
use super::walker::AddressBitWalker;
use crate::config::ReaderConfig;
use crate::error::{LoadError, LookupError};
use crate::metadata::{IpVersion, Metadata};
use crate::registry;

/// Read-only IPDB reader.
///
/// Lookups take `&self` and may run concurrently from many threads. Each
/// reader owns its offset caches; readers opened on the same file share the
/// underlying buffer.
///
/// # Example
///
/// ```ignore
/// use ipdb::Reader;
///
/// let reader = Reader::open("ipipfree.ipdb")?;
/// if let Some(fields) = reader.lookup("139.228.209.62", "CN")? {
///     println!("{}", fields[0]);
/// }
/// ```
#[derive(Debug)]
pub struct Reader {
    database: Arc<Database>,
    cache: OffsetCache,
}

impl Reader {
    /// Open a database file with default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::open_with_config(path, &ReaderConfig::default())
    }

    /// Open a database file with custom configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let database = if config.share_buffer {
            registry::open_shared(path, config.load_mode)?
        } else {
            Arc::new(Database::load(path, config.load_mode)?)
        };
        Ok(Self::from_database(database))
    }

    /// Create a reader over database bytes already in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        Ok(Self::from_database(Arc::new(Database::from_bytes(data)?)))
    }

    /// Create a reader over a loaded database with fresh caches.
    pub fn from_database(database: Arc<Database>) -> Self {
        Self {
            database,
            cache: OffsetCache::new(),
        }
    }

    /// Look up `ip` and return the field values for `language`.
    ///
    /// Returns `Ok(None)` when the database has no record for the address.
    pub fn lookup(&self, ip: &str, language: &str) -> Result<Option<Vec<String>>, LookupError> {
        let window = self.language_window(language)?;
        let ip = parse_ip(ip)?;
        self.find(ip, window)
    }

    /// Like [`Reader::lookup`], keyed by field name.
    pub fn lookup_map(
        &self,
        ip: &str,
        language: &str,
    ) -> Result<Option<HashMap<String, String>>, LookupError> {
        Ok(self.lookup(ip, language)?.map(|values| self.to_map(values)))
    }

    /// Look up an already parsed address.
    pub fn lookup_addr(&self, ip: IpAddr, language: &str) -> Result<Option<Vec<String>>, LookupError> {
        let window = self.language_window(language)?;
        self.find(ip, window)
    }

    /// Like [`Reader::lookup_addr`], keyed by field name.
    pub fn lookup_addr_map(
        &self,
        ip: IpAddr,
        language: &str,
    ) -> Result<Option<HashMap<String, String>>, LookupError> {
        Ok(self.lookup_addr(ip, language)?.map(|values| self.to_map(values)))
    }

    /// Field window of `language`, or `UnsupportedLanguage`.
    pub(crate) fn language_window(&self, language: &str) -> Result<Range<usize>, LookupError> {
        self.metadata()
            .language_window(language)
            .ok_or_else(|| LookupError::UnsupportedLanguage(language.to_string()))
    }

    fn find(&self, ip: IpAddr, window: Range<usize>) -> Result<Option<Vec<String>>, LookupError> {
        let ip = canonical(ip);
        let meta = self.metadata();
        let versions = meta.ip_version();
        match ip {
            IpAddr::V4(_) if !versions.contains(IpVersion::V4) => {
                return Err(LookupError::UnsupportedVersion("IPv4"))
            }
            IpAddr::V6(_) if !versions.contains(IpVersion::V6) => {
                return Err(LookupError::UnsupportedVersion("IPv6"))
            }
            _ => {}
        }

        let view = self.database.view();
        let walker = AddressBitWalker::new(TrieIndex::new(view, meta.node_count), &self.cache, versions);
        let leaf = match walker.find_leaf(ip)? {
            Some(leaf) => leaf,
            None => return Ok(None),
        };

        let record = RecordResolver::new(view, meta.node_count).resolve(leaf)?;
        record.window(window).map(Some)
    }

    fn to_map(&self, values: Vec<String>) -> HashMap<String, String> {
        self.metadata().fields.iter().cloned().zip(values).collect()
    }

    /// Decoded metadata header.
    pub fn metadata(&self) -> &Metadata {
        self.database.metadata()
    }

    /// Whether the database answers IPv4 lookups.
    pub fn supports_v4(&self) -> bool {
        self.metadata().supports_v4()
    }

    /// Whether the database answers IPv6 lookups.
    pub fn supports_v6(&self) -> bool {
        self.metadata().supports_v6()
    }

    /// Build time of the database.
    pub fn build_time(&self) -> SystemTime {
        self.metadata().build_time()
    }

    /// Field names of every record, in order.
    pub fn fields(&self) -> &[String] {
        &self.metadata().fields
    }

    /// Supported language codes.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.metadata().languages.keys().map(String::as_str)
    }

    /// Hex SHA-256 of the database file.
    pub fn fingerprint(&self) -> String {
        self.database
            .fingerprint()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// The shared database this reader looks up in.
    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Offset cache contents.
    pub fn cache_stats(&self) -> OffsetCacheStats {
        self.cache.stats()
    }
}

pub(crate) fn parse_ip(ip: &str) -> Result<IpAddr, LookupError> {
    ip.trim()
        .parse()
        .map_err(|_| LookupError::InvalidAddress(ip.to_string()))
}

/// IPv4-mapped IPv6 addresses are looked up as IPv4.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        IpAddr::V4(_) => ip,
    }
}
