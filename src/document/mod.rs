pub mod reader;
pub mod writer;

#[cfg(test)]
mod tests;

use std::ops::Range;
use std::path::Path;

use crossbeam::channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, trace, warn};

pub use reader::Reader;

use crate::config::DocumentConfig;
use crate::edit::{Continuation, EditKind, EditLog, EditRecord, UndoStack};
use crate::error::{Error, Result};
use crate::segment::{rebuild, SegmentList};
use crate::store::BackingStore;

/// What caused a [`ChangeEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Edit,
    Undo,
    Redo,
    Saved,
}

/// Sent after every change to a document's content or modified state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub modified: bool,
    pub size: u64,
    pub cause: ChangeCause,
}

/// An editable view of one file.
///
/// The file is never loaded whole. Reads are served from the segment
/// list, which is rebuilt from the edit log after every change.
#[derive(Debug)]
pub struct Document {
    store: BackingStore,
    segments: SegmentList,
    edits: EditLog,
    undo_stack: UndoStack,
    size: u64,
    read_only: bool,
    config: DocumentConfig,
    subscribers: Vec<Sender<ChangeEvent>>,
}

impl Document {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, DocumentConfig::default())
    }

    /// Open `path`. Files that can't be written are opened read-only
    /// instead of failing.
    pub fn open_with(path: impl AsRef<Path>, config: DocumentConfig) -> Result<Self> {
        let path = path.as_ref();
        let store = BackingStore::open(path)?;
        let size = store.size();

        if size >= config.max_size {
            return Err(Error::TooLarge {
                size,
                limit: config.max_size,
            });
        }

        let read_only = config.read_only || !BackingStore::is_writable(path);
        if read_only && !config.read_only {
            warn!(path = %path.display(), "no write access, opening read-only");
        }
        debug!(path = %path.display(), size, read_only, "opened document");

        Ok(Self {
            store,
            segments: SegmentList::pristine(size),
            edits: EditLog::new(),
            undo_stack: UndoStack::new(),
            size,
            read_only,
            config,
            subscribers: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Current logical size
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Size of the file on disk when it was opened
    pub fn original_size(&self) -> u64 {
        self.store.size()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    pub fn edits(&self) -> impl Iterator<Item = &EditRecord> {
        self.edits.iter()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &SegmentList {
        &self.segments
    }

    /// Log the current segment list
    pub fn dump_segments(&self) {
        debug!(segments = self.segments.len(), size = self.size, "segment list dump");
        self.segments.dump();
    }

    /// Receive every future [`ChangeEvent`] of this document
    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn reader(&self) -> Reader<'_> {
        Reader::new(&self.store, &self.segments, self.size)
    }

    /// Read up to `length` bytes from `address`. The result is shorter
    /// only when it runs into the end of the document.
    pub fn read(&self, address: u64, length: u32) -> Result<Vec<u8>> {
        if length == 0 {
            return Ok(Vec::new());
        }
        if address >= self.size {
            return Err(Error::OutOfRange {
                address,
                length: length as u64,
                size: self.size,
            });
        }
        let available = (self.size - address).min(length as u64) as usize;
        let mut buf = vec![0u8; available];
        let read = self.reader().read_into(address, &mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    /// Read into `buf`, returning the number of bytes filled
    pub fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<usize> {
        self.reader().read_into(address, buf)
    }

    /// Apply one keystroke-level edit.
    ///
    /// The request is fully validated first; a rejected edit leaves the
    /// document untouched.
    pub fn apply_edit(
        &mut self,
        kind: EditKind,
        address: u64,
        length: u64,
        payload: Option<&[u8]>,
        continuation: Continuation,
    ) -> Result<ChangeEvent> {
        if self.read_only {
            return Err(Error::AccessDenied {
                path: self.path().to_path_buf(),
            });
        }
        let record = EditRecord::new(kind, address, length, payload)?;
        self.check_range(kind, address, length)?;

        let checkpoint = self.edits.checkpoint();
        let outcome = self.edits.append_or_merge(record, continuation);
        if let Err(err) = self.refresh() {
            self.edits.restore(checkpoint);
            return Err(err);
        }
        self.undo_stack.clear_redo();

        trace!(?kind, address, length, ?outcome, size = self.size, "applied edit");
        Ok(self.notify(ChangeCause::Edit))
    }

    pub fn insert(
        &mut self,
        address: u64,
        bytes: &[u8],
        continuation: Continuation,
    ) -> Result<ChangeEvent> {
        self.apply_edit(EditKind::Insert, address, bytes.len() as u64, Some(bytes), continuation)
    }

    pub fn overtype(
        &mut self,
        address: u64,
        bytes: &[u8],
        continuation: Continuation,
    ) -> Result<ChangeEvent> {
        self.apply_edit(EditKind::Overtype, address, bytes.len() as u64, Some(bytes), continuation)
    }

    pub fn overtype_backward(
        &mut self,
        address: u64,
        bytes: &[u8],
        continuation: Continuation,
    ) -> Result<ChangeEvent> {
        self.apply_edit(
            EditKind::OvertypeBackward,
            address,
            bytes.len() as u64,
            Some(bytes),
            continuation,
        )
    }

    pub fn delete_forward(
        &mut self,
        address: u64,
        length: u64,
        continuation: Continuation,
    ) -> Result<ChangeEvent> {
        self.apply_edit(EditKind::DeleteForward, address, length, None, continuation)
    }

    /// Delete the `length` bytes that start at `address`, as backspace
    /// does when the cursor is at `address + length`.
    pub fn delete_backward(
        &mut self,
        address: u64,
        length: u64,
        continuation: Continuation,
    ) -> Result<ChangeEvent> {
        self.apply_edit(EditKind::DeleteBackward, address, length, None, continuation)
    }

    pub fn can_undo(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_stack.can_redo()
    }

    /// Drop the newest edit record. `None` if there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<ChangeEvent>> {
        if !self.undo_stack.undo(&mut self.edits) {
            return Ok(None);
        }
        if let Err(err) = self.refresh() {
            self.undo_stack.redo(&mut self.edits);
            return Err(err);
        }
        Ok(Some(self.notify(ChangeCause::Undo)))
    }

    /// Reapply the most recently undone record
    pub fn redo(&mut self) -> Result<Option<ChangeEvent>> {
        if !self.undo_stack.redo(&mut self.edits) {
            return Ok(None);
        }
        if let Err(err) = self.refresh() {
            self.undo_stack.undo(&mut self.edits);
            return Err(err);
        }
        Ok(Some(self.notify(ChangeCause::Redo)))
    }

    /// True when only same-size overtypes have been made, so saving can
    /// patch the original file instead of rewriting it.
    pub fn can_write_in_place(&self) -> bool {
        writer::can_write_in_place(&self.segments, self.store.size())
    }

    /// Write the in-memory bytes back into the original file.
    ///
    /// On failure the edit state is kept so the caller can retry or save
    /// elsewhere; the file itself may be partially written.
    pub fn save_in_place(&mut self) -> Result<()> {
        if self.read_only {
            return Err(Error::AccessDenied {
                path: self.path().to_path_buf(),
            });
        }
        if !self.can_write_in_place() {
            return Err(Error::InPlaceUnavailable);
        }
        if self.edits.is_empty() {
            return Ok(());
        }

        let written = writer::write_in_place(self.store.path(), &self.segments)?;

        // The file now holds what the edits described
        self.edits.clear();
        self.undo_stack.clear_redo();
        self.segments = SegmentList::pristine(self.store.size());
        self.size = self.store.size();

        info!(path = %self.path().display(), written, "saved in place");
        self.notify(ChangeCause::Saved);
        Ok(())
    }

    /// Write the whole document to a new file. The document itself is
    /// unchanged and stays bound to its original file.
    pub fn save_as(&self, dest: impl AsRef<Path>) -> Result<()> {
        self.save_range_as(0..self.size, dest)
    }

    /// Write the logical bytes in `range` to a new file
    pub fn save_range_as(&self, range: Range<u64>, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        if range.start > range.end || range.end > self.size {
            return Err(Error::OutOfRange {
                address: range.start,
                length: range.end.saturating_sub(range.start),
                size: self.size,
            });
        }
        if writer::is_same_file(self.store.path(), dest) {
            return Err(Error::SameFile {
                path: dest.to_path_buf(),
            });
        }

        // An existing destination is overwritten through the streaming path
        let copied = self.edits.is_empty()
            && range == (0..self.size)
            && writer::copy_file(self.store.path(), dest)?;
        if !copied {
            writer::write_range(self.reader(), range.clone(), dest, self.config.copy_chunk_size)?;
        }

        info!(
            path = %dest.display(),
            start = range.start,
            end = range.end,
            "saved copy"
        );
        Ok(())
    }

    fn check_range(&self, kind: EditKind, address: u64, length: u64) -> Result<()> {
        let out_of_range = Error::OutOfRange {
            address,
            length,
            size: self.size,
        };

        if kind.allows_append() {
            if address > self.size {
                return Err(out_of_range);
            }
            match self.size.checked_add(length) {
                Some(size) if size < self.config.max_size => Ok(()),
                _ => Err(Error::TooLarge {
                    size: self.size.saturating_add(length),
                    limit: self.config.max_size,
                }),
            }
        } else {
            match address.checked_add(length) {
                Some(end) if end <= self.size => Ok(()),
                _ => Err(out_of_range),
            }
        }
    }

    /// Rebuild the segment list from the edit log
    fn refresh(&mut self) -> Result<()> {
        let segments = rebuild(self.store.size(), &self.edits)?;
        self.size = segments.total_len();
        self.segments = segments;
        Ok(())
    }

    fn notify(&mut self, cause: ChangeCause) -> ChangeEvent {
        let event = ChangeEvent {
            modified: self.is_modified(),
            size: self.size,
            cause,
        };
        self.subscribers.retain(|tx| tx.send(event).is_ok());
        event
    }
}
