use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Read-only random access to the file a document was opened from.
///
/// The size is captured once at open time and never refreshed. Reads go
/// straight to the file handle; nothing is cached.
#[derive(Debug)]
pub struct BackingStore {
    path: PathBuf,
    file: File,
    size: u64,
}

impl BackingStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let metadata = file.metadata().map_err(Error::io("stat"))?;

        if !metadata.is_file() {
            return Err(Error::Io {
                op: "open",
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size: metadata.len(),
        })
    }

    /// Whether the file at `path` could be opened for writing right now.
    pub fn is_writable(path: &Path) -> bool {
        match fs::metadata(path) {
            Ok(metadata) if metadata.permissions().readonly() => false,
            Ok(_) => OpenOptions::new().write(true).open(path).is_ok(),
            Err(_) => false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Fill `buf` from `offset`. A short read is an error, since the file
    /// must not have shrunk since it was opened.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))
            .map_err(Error::io("seek"))?;
        file.read_exact(buf).map_err(Error::io("read"))?;
        Ok(buf.len())
    }
}
