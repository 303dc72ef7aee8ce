//! Error types for ipdb.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for ipdb operations.
///
/// Wraps both load-time and lookup-time failures for callers that
/// handle them the same way.
#[derive(Error, Debug)]
pub enum Error {
    /// Database could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Lookup failed
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Result type alias for ipdb operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised while opening a database. Always fatal for the reader.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File missing or unreadable
    #[error("database file {path:?} is not readable: {source}")]
    NotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata header missing, malformed or inconsistent
    #[error("invalid database metadata: {0}")]
    InvalidMetadata(String),

    /// Declared sizes disagree with the actual buffer length
    #[error("database size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Error raised by a single lookup.
///
/// A missing address is not an error; lookups report it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Input is not an IPv4 or IPv6 literal
    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    /// Language is not present in the database
    #[error("language not supported: {0}")]
    UnsupportedLanguage(String),

    /// Address family not covered by the database
    #[error("database does not support {0} addresses")]
    UnsupportedVersion(&'static str),

    /// Descent ran out of bits or left the node table
    #[error("trie traversal failed at node {node}")]
    TrieTraversalFailure { node: u32 },

    /// Leaf pointer resolves outside the data section
    #[error("record offset {offset} is outside the data section")]
    RecordOutOfBounds { offset: usize },

    /// Record payload is not usable for the requested language
    #[error("malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },
}
