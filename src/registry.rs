//! Process-wide registry of loaded database buffers.
//!
//! Readers opened on the same file share one `Arc<Database>`. Entries are
//! keyed by canonical path and checked against the file's length and
//! modification time, so a replaced file is loaded again instead of being
//! served from a stale buffer. Entries hold weak references and die with
//! their last reader.

use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use crate::binary::Database;
use crate::config::LoadMode;
use crate::error::LoadError;

/// Shared buffers by canonical path.
static REGISTRY: Lazy<Mutex<AHashMap<PathBuf, Entry>>> = Lazy::new(|| Mutex::new(AHashMap::new()));

struct Entry {
    database: Weak<Database>,
    stamp: FileStamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn read(path: &Path) -> std::io::Result<Self> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Open `path`, reusing the buffer of a live reader on the same file.
pub fn open_shared(path: &Path, mode: LoadMode) -> Result<Arc<Database>, LoadError> {
    let not_readable = |source| LoadError::NotReadable {
        path: path.to_path_buf(),
        source,
    };
    let canonical = fs::canonicalize(path).map_err(not_readable)?;
    let stamp = FileStamp::read(&canonical).map_err(not_readable)?;

    if let Some(database) = lookup_live(&canonical, stamp) {
        log::debug!("Sharing loaded database {:?}", canonical);
        return Ok(database);
    }

    // Load outside the lock
    let database = Arc::new(Database::load(&canonical, mode)?);

    let mut registry = REGISTRY.lock();
    if let Some(existing) = live_entry(&registry, &canonical, stamp) {
        log::debug!("Sharing database {:?} loaded concurrently", canonical);
        return Ok(existing);
    }
    registry.retain(|_, entry| entry.database.strong_count() > 0);
    registry.insert(
        canonical,
        Entry {
            database: Arc::downgrade(&database),
            stamp,
        },
    );
    Ok(database)
}

fn lookup_live(canonical: &Path, stamp: FileStamp) -> Option<Arc<Database>> {
    live_entry(&REGISTRY.lock(), canonical, stamp)
}

fn live_entry(
    registry: &AHashMap<PathBuf, Entry>,
    canonical: &Path,
    stamp: FileStamp,
) -> Option<Arc<Database>> {
    registry
        .get(canonical)
        .filter(|entry| entry.stamp == stamp)
        .and_then(|entry| entry.database.upgrade())
}

/// Number of files with at least one live reader.
pub fn live_databases() -> usize {
    REGISTRY
        .lock()
        .values()
        .filter(|entry| entry.database.strong_count() > 0)
        .count()
}
