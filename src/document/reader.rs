use crate::error::{Error, Result};
use crate::segment::{Segment, SegmentList};
use crate::store::BackingStore;

/// Reads logical byte ranges by walking the segment list
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    store: &'a BackingStore,
    segments: &'a SegmentList,
    size: u64,
}

impl<'a> Reader<'a> {
    pub fn new(store: &'a BackingStore, segments: &'a SegmentList, size: u64) -> Self {
        Self {
            store,
            segments,
            size,
        }
    }

    /// Fill as much of `buf` as the document holds from `address` on and
    /// return the number of bytes copied. Only the end of the document
    /// shortens a read.
    pub fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if address >= self.size {
            return Err(Error::OutOfRange {
                address,
                length: buf.len() as u64,
                size: self.size,
            });
        }

        let want = (buf.len() as u64).min(self.size - address) as usize;
        let mut filled = 0usize;

        for (start, segment) in self.segments.spans() {
            if filled == want {
                break;
            }
            let pos = address + filled as u64;
            let end = start + segment.len();
            if end <= pos {
                continue;
            }

            let within = pos - start;
            let count = (segment.len() - within).min((want - filled) as u64) as usize;
            let dest = &mut buf[filled..filled + count];

            match segment {
                Segment::MemRef { bytes } => {
                    let from = within as usize;
                    dest.copy_from_slice(&bytes[from..from + count]);
                }
                Segment::FileRef { offset, .. } => {
                    self.store.read_at(offset + within, dest)?;
                }
            }
            filled += count;
        }

        if filled != want {
            return Err(Error::InternalInconsistency(format!(
                "segments yielded {filled} of {want} bytes at {address}"
            )));
        }
        Ok(filled)
    }
}
