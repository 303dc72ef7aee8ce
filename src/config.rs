//! Reader configuration.

/// How a database file is brought into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Read the whole file into an owned buffer
    #[default]
    Memory,
    /// Memory-map the file
    Mmap,
}

/// Configuration for opening a [`Reader`](crate::Reader).
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// How the file is loaded.
    pub load_mode: LoadMode,
    /// Whether readers opened on the same file share one buffer.
    pub share_buffer: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            load_mode: LoadMode::Memory,
            share_buffer: true,
        }
    }
}

impl ReaderConfig {
    /// Configuration that memory-maps the file.
    pub fn mmap() -> Self {
        Self {
            load_mode: LoadMode::Mmap,
            ..Self::default()
        }
    }

    /// Configuration that always loads a private copy of the file.
    pub fn unshared() -> Self {
        Self {
            share_buffer: false,
            ..Self::default()
        }
    }
}
