// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    empty = { "",      4 },
    one   = { "a",     8 },
    three = { "abc",   8 },
    four  = { "abcd",  8 },
    five  = { "abcde", 12 },
)]
fn strings_are_padded_to_four_bytes(value: &str, encoded_len: usize) {
    let mut w = XdrWriter::new();
    w.put_str(value);
    let bytes = w.into_bytes();
    assert_eq!(bytes.len(), encoded_len);
    assert!(bytes[4 + value.len()..].iter().all(|b| *b == 0));
}

#[test]
fn integers_are_big_endian() {
    let mut w = XdrWriter::new();
    w.put_i32(0x0102_0304).put_u64(5);
    assert_eq!(w.into_bytes(), vec![1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 5]);
}

#[test]
fn reader_consumes_padding() {
    let mut w = XdrWriter::new();
    w.put_str("service_mgr").put_i32(-7);
    let bytes = w.into_bytes();

    let mut r = XdrReader::new(&bytes);
    assert_eq!(r.get_string().unwrap(), "service_mgr");
    assert_eq!(r.get_i32().unwrap(), -7);
    assert_eq!(r.remaining(), 0);
}

#[test]
fn truncated_integer_is_an_error() {
    let mut r = XdrReader::new(&[0, 0, 1]);
    let err = r.get_i32().unwrap_err();
    assert!(
        matches!(err, ProtocolError::Truncated { offset: 0, needed: 4, available: 3 }),
        "got {err:?}"
    );
}

#[test]
fn opaque_longer_than_buffer_is_an_error() {
    let mut r = XdrReader::new(&[0, 0, 0, 9, b'a', b'b']);
    assert!(matches!(r.get_opaque(), Err(ProtocolError::Truncated { .. })));
}

#[test]
fn negative_length_is_an_error() {
    let bytes = (-1i32).to_be_bytes();
    let mut r = XdrReader::new(&bytes);
    assert!(matches!(r.get_opaque(), Err(ProtocolError::NegativeLength(-1))));
}
