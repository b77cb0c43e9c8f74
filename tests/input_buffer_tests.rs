//! Input buffer tests

use pic_writer::command::{InputBuffer, INPUT_CAPACITY};

#[test]
fn test_read_slot_excludes_terminator() {
    let mut buf = InputBuffer::new();
    assert_eq!(buf.read_slot().len(), INPUT_CAPACITY);
    assert_eq!(INPUT_CAPACITY, 15);
}

#[test]
fn test_set_len_clamps() {
    let mut buf = InputBuffer::new();
    buf.set_len(100);
    assert_eq!(buf.len(), INPUT_CAPACITY);
}

#[test]
fn test_terminate_text() {
    let mut buf = InputBuffer::new();
    buf.read_slot()[..3].copy_from_slice(b"abc");
    buf.set_len(3);

    assert_eq!(buf.terminate(), "abc");
    assert_eq!(buf.as_bytes_with_nul(), b"abc\0");
}

#[test]
fn test_terminate_invalid_utf8() {
    let mut buf = InputBuffer::new();
    buf.read_slot()[..2].copy_from_slice(&[0xC3, 0x28]);
    buf.set_len(2);

    assert_eq!(buf.terminate(), "<invalid utf8>");
    assert_eq!(buf.as_bytes(), &[0xC3, 0x28]);
}

#[test]
fn test_clear() {
    let mut buf = InputBuffer::new();
    buf.set_len(4);
    buf.clear();

    assert!(buf.is_empty());
    assert_eq!(buf.as_bytes(), b"");
}
