pub mod rebuild;

pub use rebuild::rebuild;

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// One run of bytes in the logical document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Bytes still in the backing file
    FileRef { offset: u64, len: u64 },
    /// Bytes owned in memory
    MemRef { bytes: Vec<u8> },
}

impl Segment {
    pub fn len(&self) -> u64 {
        match self {
            Segment::FileRef { len, .. } => *len,
            Segment::MemRef { bytes } => bytes.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep the first `at` bytes and return the rest as a new segment of
    /// the same kind. `at` must be strictly inside the segment.
    fn split_off(&mut self, at: u64) -> Segment {
        match self {
            Segment::FileRef { offset, len } => {
                let tail = Segment::FileRef {
                    offset: *offset + at,
                    len: *len - at,
                };
                *len = at;
                tail
            }
            Segment::MemRef { bytes } => Segment::MemRef {
                bytes: bytes.split_off(at as usize),
            },
        }
    }
}

/// Piece table: ordered segments covering the document end to end.
///
/// Segment `i` starts at the sum of the lengths before it. Only
/// [`rebuild`] produces non-trivial lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentList {
    segments: Vec<Segment>,
}

impl SegmentList {
    /// The untouched file as a single segment
    pub fn pristine(file_size: u64) -> Self {
        let segments = if file_size == 0 {
            Vec::new()
        } else {
            vec![Segment::FileRef {
                offset: 0,
                len: file_size,
            }]
        };
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_len(&self) -> u64 {
        self.segments.iter().map(Segment::len).sum()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments paired with their logical start address
    pub fn spans(&self) -> Spans<'_> {
        Spans {
            inner: self.segments.iter(),
            start: 0,
        }
    }

    /// Insert `bytes` so they start at logical `address`
    pub fn insert(&mut self, address: u64, bytes: Vec<u8>) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let index = self.split_at(address)?;
        self.segments.insert(index, Segment::MemRef { bytes });
        Ok(())
    }

    /// Remove `length` bytes starting at logical `address`
    pub fn remove(&mut self, address: u64, length: u64) -> Result<()> {
        let end = address.checked_add(length).ok_or_else(|| {
            Error::InternalInconsistency(format!("removal {address}+{length} overflows"))
        })?;
        let first = self.split_at(address)?;
        let last = self.split_at(end)?;
        self.segments.drain(first..last);
        Ok(())
    }

    /// Make `address` a segment boundary and return the index of the
    /// segment starting there (or `len()` at the very end).
    fn split_at(&mut self, address: u64) -> Result<usize> {
        let mut start = 0;
        let mut found = None;
        for (index, segment) in self.segments.iter().enumerate() {
            if address < start + segment.len() {
                found = Some(index);
                break;
            }
            start += segment.len();
        }

        match found {
            Some(index) if address == start => Ok(index),
            Some(index) => {
                let at = address - start;
                let tail = self.segments[index].split_off(at);
                trace!(index, at, tail_len = tail.len(), "split segment");
                self.segments.insert(index + 1, tail);
                Ok(index + 1)
            }
            None if address == start => Ok(self.segments.len()),
            None => Err(Error::InternalInconsistency(format!(
                "address {address} beyond segment list end {start}"
            ))),
        }
    }

    /// Log every segment at debug level
    pub fn dump(&self) {
        for (index, (start, segment)) in self.spans().enumerate() {
            match segment {
                Segment::FileRef { offset, len } => {
                    debug!(index, start, len, offset, "segment: file")
                }
                Segment::MemRef { bytes } => {
                    debug!(index, start, len = bytes.len(), "segment: memory")
                }
            }
        }
    }
}

/// Iterator returned by [`SegmentList::spans`]
pub struct Spans<'a> {
    inner: std::slice::Iter<'a, Segment>,
    start: u64,
}

impl<'a> Iterator for Spans<'a> {
    type Item = (u64, &'a Segment);

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.inner.next()?;
        let start = self.start;
        self.start += segment.len();
        Some((start, segment))
    }
}
