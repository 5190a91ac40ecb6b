use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use super::*;

fn fixture(content: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn contents(doc: &Document) -> Vec<u8> {
    if doc.size() == 0 {
        return Vec::new();
    }
    doc.read(0, doc.size() as u32).unwrap()
}

#[test]
fn test_overtype_run_coalesces() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();

    doc.overtype(2, b"X", Continuation::Fresh).unwrap();
    doc.overtype(3, b"X", Continuation::Continue).unwrap();
    doc.overtype(4, b"X", Continuation::Continue).unwrap();

    assert_eq!(contents(&doc), b"01XXX56789");
    assert_eq!(doc.edit_count(), 1);
    let record = doc.edits().next().unwrap();
    assert_eq!((record.address, record.length), (2, 3));
    assert!(doc.is_modified());
}

#[test]
fn test_fresh_overtypes_stay_separate() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();

    for address in 2..5 {
        doc.overtype(address, b"X", Continuation::Fresh).unwrap();
    }

    assert_eq!(contents(&doc), b"01XXX56789");
    assert_eq!(doc.edit_count(), 3);
}

#[test]
fn test_hex_nibbles_make_one_record_per_byte() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();

    // Typing "AB" "CD" in insert mode at offset 3
    doc.insert(3, &[0x0A], Continuation::Fresh).unwrap();
    doc.insert(3, &[0xAB], Continuation::Continue).unwrap();
    doc.insert(4, &[0x0C], Continuation::Continue).unwrap();
    doc.insert(4, &[0xCD], Continuation::Continue).unwrap();

    assert_eq!(doc.size(), 12);
    assert_eq!(doc.edit_count(), 1);
    assert_eq!(contents(&doc), b"012\xAB\xCD3456789");
}

#[test]
fn test_delete_then_save_as() {
    let (dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();

    doc.delete_forward(0, 5, Continuation::Fresh).unwrap();
    assert_eq!(doc.size(), 5);

    let copy = dir.path().join("copy.bin");
    doc.save_as(&copy).unwrap();
    assert_eq!(fs::read(&copy).unwrap(), b"56789");

    // save-as is a copy, not a commit
    assert!(doc.is_modified());
    assert_eq!(fs::read(&path).unwrap(), b"0123456789");

    let reopened = Document::open(&copy).unwrap();
    assert!(!reopened.is_modified());
    assert_eq!(contents(&reopened), b"56789");
}

#[test]
fn test_save_as_small_chunks() {
    let (dir, path) = fixture(b"abcdefghijklmnopqrstuvwxyz");
    let config = DocumentConfig::new().copy_chunk_size(3);
    let mut doc = Document::open_with(&path, config).unwrap();

    doc.insert(13, b"--", Continuation::Fresh).unwrap();
    doc.delete_backward(0, 2, Continuation::Fresh).unwrap();

    let copy = dir.path().join("copy.bin");
    doc.save_as(&copy).unwrap();
    assert_eq!(fs::read(&copy).unwrap(), b"cdefghijklm--nopqrstuvwxyz");
}

#[test]
fn test_unmodified_save_as_copies_file() {
    let (dir, path) = fixture(b"untouched");
    let doc = Document::open(&path).unwrap();

    let copy = dir.path().join("copy.bin");
    doc.save_as(&copy).unwrap();
    assert_eq!(fs::read(&copy).unwrap(), b"untouched");
}

#[test]
fn test_save_as_overwrites_existing_file() {
    let (dir, path) = fixture(b"untouched");
    let mut doc = Document::open(&path).unwrap();
    let copy = dir.path().join("copy.bin");

    fs::write(&copy, b"old contents here").unwrap();
    doc.save_as(&copy).unwrap();
    assert_eq!(fs::read(&copy).unwrap(), b"untouched");

    doc.overtype(0, b"U", Continuation::Fresh).unwrap();
    doc.save_as(&copy).unwrap();
    assert_eq!(fs::read(&copy).unwrap(), b"Untouched");
}

#[test]
fn test_save_range_as() {
    let (dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();
    doc.overtype(4, b"ab", Continuation::Fresh).unwrap();

    let part = dir.path().join("part.bin");
    doc.save_range_as(3..7, &part).unwrap();
    assert_eq!(fs::read(&part).unwrap(), b"3ab6");

    let err = doc.save_range_as(5..11, dir.path().join("bad.bin")).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));
}

#[test]
fn test_save_as_onto_self_rejected() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();
    doc.delete_forward(0, 1, Continuation::Fresh).unwrap();

    let err = doc.save_as(&path).unwrap_err();
    assert!(matches!(err, Error::SameFile { .. }));
    assert_eq!(fs::read(&path).unwrap(), b"0123456789");
}

#[test]
fn test_save_as_onto_hard_link_rejected() {
    let (dir, path) = fixture(b"0123456789");
    let link = dir.path().join("link.bin");
    fs::hard_link(&path, &link).unwrap();

    let mut doc = Document::open(&path).unwrap();
    doc.delete_forward(0, 1, Continuation::Fresh).unwrap();

    let err = doc.save_as(&link).unwrap_err();
    assert!(matches!(err, Error::SameFile { .. }));
    assert_eq!(fs::read(&path).unwrap(), b"0123456789");
    assert_eq!(contents(&doc), b"123456789");
}

#[test]
fn test_edits_at_end_of_document() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();

    let err = doc.overtype(10, b"x", Continuation::Fresh).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { address: 10, .. }));
    let err = doc.delete_forward(10, 1, Continuation::Fresh).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));
    let err = doc.delete_backward(9, 2, Continuation::Fresh).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));
    assert!(!doc.is_modified());

    doc.insert(10, b"!", Continuation::Fresh).unwrap();
    assert_eq!(contents(&doc), b"0123456789!");
}

#[test]
fn test_invalid_edit_leaves_state_untouched() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();
    doc.overtype(0, b"a", Continuation::Fresh).unwrap();

    let err = doc
        .apply_edit(EditKind::Overtype, 1, 0, Some(&[][..]), Continuation::Continue)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidEdit(_)));
    let err = doc
        .apply_edit(EditKind::DeleteForward, 1, 1, Some(&b"x"[..]), Continuation::Fresh)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidEdit(_)));

    assert_eq!(doc.edit_count(), 1);
    assert_eq!(contents(&doc), b"a123456789");
}

#[test]
fn test_read_across_segments() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();

    doc.insert(2, b"ab", Continuation::Fresh).unwrap();
    doc.overtype(6, b"Z", Continuation::Fresh).unwrap();
    doc.insert(0, b"<", Continuation::Fresh).unwrap();
    doc.insert(doc.size(), b">", Continuation::Fresh).unwrap();
    assert!(doc.segment_count() >= 6);

    assert_eq!(contents(&doc), b"<01ab23Z56789>");
    assert_eq!(doc.read(3, 5).unwrap(), b"ab23Z");

    // Reads stop at the end of the document
    assert_eq!(doc.read(12, 100).unwrap(), b"9>");
    let err = doc.read(14, 1).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));
    assert!(doc.read(14, 0).unwrap().is_empty());
}

#[test]
fn test_in_place_eligibility() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();
    assert!(doc.can_write_in_place());

    doc.overtype(1, b"x", Continuation::Fresh).unwrap();
    assert!(doc.can_write_in_place());

    doc.insert(1, b"y", Continuation::Fresh).unwrap();
    assert!(!doc.can_write_in_place());
    doc.undo().unwrap();
    assert!(doc.can_write_in_place());

    doc.delete_forward(1, 1, Continuation::Fresh).unwrap();
    assert!(!doc.can_write_in_place());
    assert!(matches!(doc.save_in_place(), Err(Error::InPlaceUnavailable)));
    assert_eq!(doc.edit_count(), 2);
}

#[test]
fn test_save_in_place() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();
    let events = doc.subscribe();

    doc.overtype(2, b"ab", Continuation::Fresh).unwrap();
    doc.overtype_backward(8, b"z", Continuation::Fresh).unwrap();
    doc.save_in_place().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"01ab4567z9");
    assert!(!doc.is_modified());
    assert_eq!(doc.edit_count(), 0);
    assert_eq!(doc.segment_count(), 1);
    assert!(!doc.can_undo());
    assert_eq!(contents(&doc), b"01ab4567z9");

    let last = events.try_iter().last().unwrap();
    assert_eq!(last.cause, ChangeCause::Saved);
    assert!(!last.modified);
}

#[test]
fn test_read_only_document() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open_with(&path, DocumentConfig::new().read_only(true)).unwrap();
    assert!(doc.is_read_only());

    let err = doc.overtype(0, b"x", Continuation::Fresh).unwrap_err();
    assert!(matches!(err, Error::AccessDenied { .. }));
    assert!(matches!(doc.save_in_place(), Err(Error::AccessDenied { .. })));
    assert_eq!(contents(&doc), b"0123456789");
}

#[test]
fn test_unwritable_file_opens_read_only() {
    let (_dir, path) = fixture(b"0123456789");
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&path, permissions).unwrap();

    let doc = Document::open(&path).unwrap();
    assert!(doc.is_read_only());
    assert_eq!(doc.read(0, 3).unwrap(), b"012");
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Document::open(dir.path().join("nope.bin")).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_size_limit() {
    let (_dir, path) = fixture(b"0123456789");

    let err = Document::open_with(&path, DocumentConfig::new().max_size(10)).unwrap_err();
    assert!(matches!(err, Error::TooLarge { size: 10, limit: 10 }));

    let mut doc = Document::open_with(&path, DocumentConfig::new().max_size(12)).unwrap();
    doc.insert(0, b"a", Continuation::Fresh).unwrap();
    let err = doc.insert(0, b"b", Continuation::Fresh).unwrap_err();
    assert!(matches!(err, Error::TooLarge { .. }));
    assert_eq!(doc.size(), 11);
}

#[test]
fn test_undo_redo() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();
    assert_eq!(doc.undo().unwrap(), None);

    doc.delete_forward(0, 2, Continuation::Fresh).unwrap();
    doc.insert(0, b"ab", Continuation::Fresh).unwrap();
    assert_eq!(contents(&doc), b"ab23456789");

    let event = doc.undo().unwrap().unwrap();
    assert_eq!(event.cause, ChangeCause::Undo);
    assert_eq!(contents(&doc), b"23456789");

    doc.undo().unwrap();
    assert_eq!(contents(&doc), b"0123456789");
    assert!(!doc.is_modified());

    doc.redo().unwrap();
    assert_eq!(contents(&doc), b"23456789");
    assert!(doc.can_redo());

    // A new edit discards what was undone
    doc.overtype(0, b"X", Continuation::Fresh).unwrap();
    assert!(!doc.can_redo());
    assert_eq!(doc.redo().unwrap(), None);
    assert_eq!(contents(&doc), b"X3456789");
}

#[test]
fn test_change_events() {
    let (_dir, path) = fixture(b"0123456789");
    let mut doc = Document::open(&path).unwrap();
    let events = doc.subscribe();
    let dropped = doc.subscribe();
    drop(dropped);

    let event = doc.insert(0, b"x", Continuation::Fresh).unwrap();
    assert_eq!(
        event,
        ChangeEvent {
            modified: true,
            size: 11,
            cause: ChangeCause::Edit
        }
    );
    assert_eq!(events.try_recv().unwrap(), event);

    doc.undo().unwrap();
    let event = events.try_recv().unwrap();
    assert!(!event.modified);
    assert_eq!(event.size, 10);

    // Rejected edits emit nothing
    assert!(doc.overtype(10, b"x", Continuation::Fresh).is_err());
    assert!(events.try_recv().is_err());
}

#[test]
fn test_empty_file() {
    let (_dir, path) = fixture(b"");
    let mut doc = Document::open(&path).unwrap();
    assert_eq!(doc.size(), 0);
    assert_eq!(doc.segment_count(), 0);

    doc.insert(0, b"hi", Continuation::Fresh).unwrap();
    assert_eq!(contents(&doc), b"hi");
    assert!(!doc.can_write_in_place());

    doc.delete_backward(0, 2, Continuation::Fresh).unwrap();
    assert_eq!(doc.size(), 0);
    assert!(doc.can_write_in_place());
}
