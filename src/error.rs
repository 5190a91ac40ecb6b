use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors returned by every fallible document operation
#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("access denied: {}", path.display())]
    AccessDenied { path: PathBuf },

    #[error("I/O error during {op}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("file of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("range {address}+{length} is outside the document ({size} bytes)")]
    OutOfRange { address: u64, length: u64, size: u64 },

    #[error("invalid edit: {0}")]
    InvalidEdit(&'static str),

    /// The segment list disagrees with the edit log. Always a bug.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("document has size-changing edits and cannot be written in place")]
    InPlaceUnavailable,

    #[error("refusing to overwrite the open file {}", path.display())]
    SameFile { path: PathBuf },
}

impl Error {
    /// Classify an error raised while opening `path`.
    pub(crate) fn open(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => Error::AccessDenied {
                path: path.to_path_buf(),
            },
            _ => Error::Io { op: "open", source },
        }
    }

    /// Adapter for `map_err` on mid-operation I/O.
    pub(crate) fn io(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Io { op, source }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Error::InternalInconsistency(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
