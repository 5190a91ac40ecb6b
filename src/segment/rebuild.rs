use tracing::{debug, trace};

use super::SegmentList;
use crate::edit::{EditKind, EditLog};
use crate::error::{Error, Result};

/// Derive the segment list from scratch by replaying every record of
/// `log` over the pristine file of `original_size` bytes.
///
/// Fails with [`Error::InternalInconsistency`] if a record does not fit
/// the list it is applied to, or if the final length disagrees with the
/// size the log implies.
pub fn rebuild(original_size: u64, log: &EditLog) -> Result<SegmentList> {
    let mut list = SegmentList::pristine(original_size);

    for (index, record) in log.iter().enumerate() {
        trace!(
            index,
            kind = ?record.kind,
            address = record.address,
            length = record.length,
            "replay edit"
        );

        match record.kind {
            EditKind::Insert => list.insert(record.address, record.payload().to_vec())?,
            EditKind::Overtype | EditKind::OvertypeBackward => {
                list.remove(record.address, record.length)?;
                list.insert(record.address, record.payload().to_vec())?;
            }
            EditKind::DeleteForward | EditKind::DeleteBackward => {
                list.remove(record.address, record.length)?
            }
        }
    }

    let expected = log.expected_size(original_size).ok_or_else(|| {
        Error::InternalInconsistency("edit log removes more bytes than exist".to_string())
    })?;
    let actual = list.total_len();
    if actual != expected {
        return Err(Error::InternalInconsistency(format!(
            "segment list covers {actual} bytes, edit log implies {expected}"
        )));
    }

    debug!(
        edits = log.len(),
        segments = list.len(),
        size = actual,
        "rebuilt segment list"
    );
    Ok(list)
}
