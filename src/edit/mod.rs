pub mod log;
pub mod undo;

pub use log::{Coalesced, EditLog};
pub use undo::UndoStack;

use crate::error::{Error, Result};

/// Kind of mutation a user made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Bytes inserted before `address`
    Insert,
    /// Bytes replaced starting at `address`
    Overtype,
    /// Bytes removed with DEL
    DeleteForward,
    /// Bytes removed with backspace
    DeleteBackward,
    /// Backspace in overtype mode
    OvertypeBackward,
}

impl EditKind {
    /// Whether records of this kind carry the new bytes
    pub fn has_payload(self) -> bool {
        matches!(
            self,
            EditKind::Insert | EditKind::Overtype | EditKind::OvertypeBackward
        )
    }

    pub fn is_deletion(self) -> bool {
        matches!(self, EditKind::DeleteForward | EditKind::DeleteBackward)
    }

    /// Whether the edit may target `address == size`
    pub fn allows_append(self) -> bool {
        self == EditKind::Insert
    }
}

/// Whether an edit continues the previous keystroke's edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Start a new record
    #[default]
    Fresh,
    /// Merge into the newest record if it is adjacent
    Continue,
}

/// One entry of the edit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub kind: EditKind,
    pub address: u64,
    pub length: u64,
    /// New bytes; `None` for deletions
    pub payload: Option<Vec<u8>>,
}

impl EditRecord {
    /// Build a record, copying `payload`. Only the shape is checked here;
    /// range checks need the document size.
    pub fn new(kind: EditKind, address: u64, length: u64, payload: Option<&[u8]>) -> Result<Self> {
        if length == 0 {
            return Err(Error::InvalidEdit("edit length must be non-zero"));
        }

        let payload = match (kind.has_payload(), payload) {
            (true, Some(bytes)) if bytes.len() as u64 == length => Some(bytes.to_vec()),
            (true, Some(_)) => {
                return Err(Error::InvalidEdit("payload length does not match edit length"))
            }
            (true, None) => return Err(Error::InvalidEdit("edit requires a payload")),
            (false, Some(_)) => return Err(Error::InvalidEdit("deletions take no payload")),
            (false, None) => None,
        };

        Ok(Self {
            kind,
            address,
            length,
            payload,
        })
    }

    pub fn payload(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or(&[])
    }

    /// One past the last logical address touched
    pub fn end(&self) -> u64 {
        self.address + self.length
    }

    /// Bytes added to (positive) or removed from the document
    pub fn size_delta(&self) -> i64 {
        match self.kind {
            EditKind::Insert => self.length as i64,
            kind if kind.is_deletion() => -(self.length as i64),
            _ => 0,
        }
    }
}
