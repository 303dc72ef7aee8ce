//! ipdb - read-only IP geolocation lookups over the IPDB binary format.
//!
//! An IPDB file maps IPv4 and IPv6 networks to multi-language records
//! (country, region, city, ISP, ...) through a binary trie over address
//! bits. This crate loads such a file once and answers lookups from memory.
//!
//! # Features
//!
//! - **Dual-stack lookups**: IPv4, IPv6 and IPv4-mapped IPv6 addresses
//! - **Multi-language records**: every language window of a record is
//!   addressable by language code
//! - **Thread-safe**: lookups take `&self` and share one buffer per file
//! - **Lazy offset caches**: the IPv4 sub-trie root and 16-bit IPv6
//!   prefixes are resolved once per reader
//! - **Hot reload**: [`CachedReader`] adds a result cache and atomic
//!   database replacement
//!
//! # Quick Start
//!
//! ```ignore
//! use ipdb::Reader;
//!
//! let reader = Reader::open("ipipfree.ipdb")?;
//!
//! match reader.lookup("139.228.209.62", "CN")? {
//!     Some(fields) => println!("{}", fields.join(" ")),
//!     None => println!("not found"),
//! }
//!
//! let map = reader.lookup_map("104.189.119.69", "CN")?;
//! ```
//!
//! # Results
//!
//! A lookup returns `Ok(Some(values))` on a hit, `Ok(None)` when the
//! database has no record for the address, and [`LookupError`] when the
//! input is invalid or the database is corrupt.

mod config;
mod error;
mod metadata;
mod registry;

pub mod binary;

// Re-export core types
pub use config::{LoadMode, ReaderConfig};
pub use error::{Error, LoadError, LookupError, Result};
pub use metadata::{IpVersion, Metadata};

// Re-export reader types
pub use binary::{CacheStats, CachedReader, CachedReaderConfig, Database, Reader};

// Re-export registry inspection
pub use registry::live_databases;
