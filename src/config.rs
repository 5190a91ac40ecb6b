/// Exclusive upper bound on document size: offsets must fit in 32 bits.
pub const DEFAULT_MAX_SIZE: u64 = 1 << 32;

/// Chunk size used when streaming a document into a new file.
pub const DEFAULT_COPY_CHUNK_SIZE: usize = 16 * 1024;

/// Options for opening a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Open read-only even when the file is writable
    pub read_only: bool,
    /// Files (and edited documents) of this size or larger are rejected
    pub max_size: u64,
    /// Bytes read per step by save-as
    pub copy_chunk_size: usize,
}

impl DocumentConfig {
    pub fn new() -> Self {
        Self {
            read_only: false,
            max_size: DEFAULT_MAX_SIZE,
            copy_chunk_size: DEFAULT_COPY_CHUNK_SIZE,
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn copy_chunk_size(mut self, size: usize) -> Self {
        self.copy_chunk_size = size.max(1);
        self
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new()
    }
}
