//! Loaded database buffer and its decoded header.

use memmap2::Mmap;
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::ops::Deref;
use std::path::Path;

use super::view::ByteView;
use crate::config::LoadMode;
use crate::error::LoadError;
use crate::metadata::Metadata;

/// Backing bytes of a database.
enum Storage {
    Memory(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Storage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Memory(data) => data,
            Storage::Mapped(mmap) => mmap,
        }
    }
}

/// Immutable database: raw bytes, metadata and node table origin.
///
/// Shared between readers through `Arc`; nothing in here changes after
/// construction apart from the lazily computed fingerprint.
pub struct Database {
    storage: Storage,
    metadata: Metadata,
    node_table_start: usize,
    fingerprint: OnceCell<[u8; 32]>,
}

impl Database {
    /// Load and validate a database file.
    pub fn load(path: &Path, mode: LoadMode) -> Result<Self, LoadError> {
        let not_readable = |source| LoadError::NotReadable {
            path: path.to_path_buf(),
            source,
        };

        let storage = match mode {
            LoadMode::Memory => Storage::Memory(fs::read(path).map_err(not_readable)?),
            LoadMode::Mmap => {
                let file = File::open(path).map_err(not_readable)?;
                let mmap = unsafe { Mmap::map(&file) }.map_err(not_readable)?;
                Storage::Mapped(mmap)
            }
        };

        let db = Self::from_storage(storage)?;
        log::debug!(
            "Loaded database {:?} ({} bytes, {} nodes, {:?})",
            path,
            db.len(),
            db.metadata.node_count,
            mode
        );
        Ok(db)
    }

    /// Validate a database held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        Self::from_storage(Storage::Memory(data))
    }

    fn from_storage(storage: Storage) -> Result<Self, LoadError> {
        let (metadata, node_table_start) = Metadata::parse(&storage)?;
        Ok(Self {
            storage,
            metadata,
            node_table_start,
            fingerprint: OnceCell::new(),
        })
    }

    /// Decoded metadata header.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Absolute offset of the node table.
    pub fn node_table_start(&self) -> usize {
        self.node_table_start
    }

    /// View rooted at the node table.
    pub fn view(&self) -> ByteView<'_> {
        ByteView::new(&self.storage, self.node_table_start)
    }

    /// Total file size in bytes.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the buffer is empty. Never true for a validated database.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// SHA-256 of the whole file, computed on first use.
    pub fn fingerprint(&self) -> &[u8; 32] {
        self.fingerprint.get_or_init(|| Sha256::digest(&*self.storage).into())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("len", &self.len())
            .field("node_table_start", &self.node_table_start)
            .field("metadata", &self.metadata)
            .finish()
    }
}
