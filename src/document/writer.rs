use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

use super::reader::Reader;
use crate::error::{Error, Result};
use crate::segment::{Segment, SegmentList};

/// Whether `segments` can be persisted by patching the original file:
/// the size is unchanged and every file-backed segment still sits at its
/// original offset.
pub fn can_write_in_place(segments: &SegmentList, original_size: u64) -> bool {
    segments.total_len() == original_size
        && segments.spans().all(|(start, segment)| match segment {
            Segment::FileRef { offset, .. } => *offset == start,
            Segment::MemRef { .. } => true,
        })
}

/// Write every in-memory segment over the bytes it replaces in `path`.
/// Returns the number of bytes written.
pub fn write_in_place(path: &Path, segments: &SegmentList) -> Result<u64> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| Error::open(path, e))?;
    let mut written = 0;

    for (start, segment) in segments.spans() {
        match segment {
            Segment::MemRef { bytes } => {
                file.seek(SeekFrom::Start(start))
                    .map_err(Error::io("seek"))?;
                file.write_all(bytes).map_err(Error::io("write"))?;
                written += bytes.len() as u64;
            }
            Segment::FileRef { offset, .. } if *offset != start => {
                return Err(Error::InternalInconsistency(format!(
                    "file segment at {start} maps to offset {offset}"
                )));
            }
            Segment::FileRef { .. } => {}
        }
    }

    file.sync_all().map_err(Error::io("sync"))?;
    Ok(written)
}

/// Stream the logical `range` into a new file at `dest`, `chunk_size`
/// bytes at a time.
pub fn write_range(
    reader: Reader<'_>,
    range: Range<u64>,
    dest: &Path,
    chunk_size: usize,
) -> Result<()> {
    let mut file = File::create(dest).map_err(|e| Error::open(dest, e))?;
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut address = range.start;

    while address < range.end {
        let want = (range.end - address).min(buf.len() as u64) as usize;
        let read = reader.read_into(address, &mut buf[..want])?;
        if read == 0 {
            return Err(Error::InternalInconsistency(format!(
                "empty read at {address} before end {}",
                range.end
            )));
        }
        file.write_all(&buf[..read]).map_err(Error::io("write"))?;
        address += read as u64;
    }

    file.sync_all().map_err(Error::io("sync"))?;
    Ok(())
}

/// Copy an unmodified file, cloning extents where the filesystem can.
/// Returns `false` without touching anything if `to` already exists.
pub fn copy_file(from: &Path, to: &Path) -> Result<bool> {
    match reflink_copy::reflink_or_copy(from, to) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(Error::io("copy")(e)),
    }
}

/// Whether both paths name the same existing file, hard links included
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    same_file::is_same_file(a, b).unwrap_or(false)
}
