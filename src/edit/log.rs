use super::{Continuation, EditKind, EditRecord};

/// How `append_or_merge` stored a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coalesced {
    /// Pushed as a new record
    Appended,
    /// Grew the newest record
    Extended,
    /// Rewrote the last byte of the newest record (second hex nibble)
    Rewrote,
}

/// Ordered history of every edit since open or the last in-place save.
///
/// Adjacent keystrokes are merged here and nowhere else; the segment
/// list is always rebuilt from these records.
#[derive(Debug, Clone, Default)]
pub struct EditLog {
    records: Vec<EditRecord>,
}

/// Snapshot taken before a mutation so it can be rolled back
#[derive(Debug, Clone)]
pub struct Checkpoint {
    len: usize,
    last: Option<EditRecord>,
}

impl EditLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Add `record`, merging it into the newest record when the caller
    /// says it continues that edit and the addresses line up.
    pub fn append_or_merge(&mut self, record: EditRecord, continuation: Continuation) -> Coalesced {
        let record = match (continuation, self.records.last_mut()) {
            (Continuation::Continue, Some(last)) => match merge(last, record) {
                Ok(outcome) => return outcome,
                Err(record) => record,
            },
            _ => record,
        };

        self.records.push(record);
        Coalesced::Appended
    }

    /// Append without attempting to merge
    pub fn push(&mut self, record: EditRecord) {
        self.records.push(record);
    }

    pub fn pop(&mut self) -> Option<EditRecord> {
        self.records.pop()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&EditRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditRecord> {
        self.records.iter()
    }

    /// Size the document must have once every record is applied to a
    /// file of `original_size` bytes. `None` if the log would underflow.
    pub fn expected_size(&self, original_size: u64) -> Option<u64> {
        self.records
            .iter()
            .try_fold(original_size, |size, record| {
                size.checked_add_signed(record.size_delta())
            })
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            len: self.records.len(),
            last: self.records.last().cloned(),
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.records.truncate(checkpoint.len);
        if let (Some(slot), Some(last)) = (self.records.last_mut(), checkpoint.last) {
            *slot = last;
        }
    }
}

impl<'a> IntoIterator for &'a EditLog {
    type Item = &'a EditRecord;
    type IntoIter = std::slice::Iter<'a, EditRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Fold `record` into `last`, or hand it back if it is not a continuation.
fn merge(last: &mut EditRecord, record: EditRecord) -> Result<Coalesced, EditRecord> {
    if last.kind != record.kind {
        return Err(record);
    }

    match record.kind {
        EditKind::DeleteForward if record.address == last.address => {
            last.length += record.length;
            Ok(Coalesced::Extended)
        }
        // Backspacing walks down through the file
        EditKind::DeleteBackward if record.end() == last.address => {
            last.address = record.address;
            last.length += record.length;
            Ok(Coalesced::Extended)
        }
        EditKind::OvertypeBackward if record.end() == last.address => {
            let mut payload = record.payload.unwrap_or_default();
            payload.extend_from_slice(last.payload());
            last.payload = Some(payload);
            last.address = record.address;
            last.length += record.length;
            Ok(Coalesced::Extended)
        }
        EditKind::Insert | EditKind::Overtype if record.address == last.end() => {
            last.payload
                .get_or_insert_with(Vec::new)
                .extend_from_slice(record.payload());
            last.length += record.length;
            Ok(Coalesced::Extended)
        }
        // Second nibble of the byte just written
        EditKind::Insert | EditKind::Overtype if record.address + 1 == last.end() => {
            let bytes = record.payload();
            let payload = last.payload.get_or_insert_with(Vec::new);
            if let (Some(slot), Some(&first)) = (payload.last_mut(), bytes.first()) {
                *slot = first;
            }
            payload.extend_from_slice(&bytes[1..]);
            last.length += record.length - 1;
            Ok(Coalesced::Rewrote)
        }
        _ => Err(record),
    }
}
