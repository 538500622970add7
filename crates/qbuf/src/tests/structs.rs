use rstest::rstest;

use crate::{BufferQueue, Bytes, ErrorKind, FormatError, QueueError, StructFormat, StructValue};

#[test]
fn pop_struct_sequence() {
    let mut queue = BufferQueue::new();
    queue.push(&b"\x01\x02\x03\x04\x05\x06"[..]);
    assert_eq!(
        queue.pop_struct("!BH").unwrap(),
        [StructValue::UInt(1), StructValue::UInt(0x0203)]
    );
    assert_eq!(queue.pop_struct("!H").unwrap(), [StructValue::UInt(0x0405)]);

    let err = queue.pop_struct("!H").unwrap_err();
    assert!(err.is_underflow());
    assert_eq!(queue.len(), 1);

    let err = queue.pop_struct("_bad_struct_format").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(
        err,
        QueueError::Format(FormatError::UnknownCode { ch: '_', pos: 0 })
    );
    assert_eq!(queue.len(), 1);
}

#[test]
fn struct_spanning_chunks() {
    let mut queue = BufferQueue::new();
    queue.push_many([&b"\x00\x00"[..], b"\x01", b"\x00hi", b"!"]);
    let format = StructFormat::parse("<I2s").unwrap();
    let values = queue.pop_struct_with(&format).unwrap();
    assert_eq!(values[0].as_u64(), Some(0x0001_0000));
    assert_eq!(values[1].as_bytes(), Some(&Bytes::from_static(b"hi")));
    assert_eq!(queue.pop_all(), "!");
}

#[rstest]
#[case("!h", &[0x80, 0x00], StructValue::Int(-32768))]
#[case("!q", &[0xff; 8], StructValue::Int(-1))]
#[case("<Q", &[0xff; 8], StructValue::UInt(u64::MAX))]
#[case("!?", &[0x02], StructValue::Bool(true))]
#[case("!f", &[0x3f, 0x80, 0, 0], StructValue::Float(1.0))]
#[case("<e", &[0x00, 0xc0], StructValue::Float(-2.0))]
fn single_values(#[case] format: &str, #[case] data: &[u8], #[case] expected: StructValue) {
    let mut queue = BufferQueue::new();
    queue.push_slice(data);
    assert_eq!(queue.pop_struct(format).unwrap(), [expected]);
    assert!(queue.is_empty());
}

#[test]
fn pad_bytes_produce_no_values() {
    let format = StructFormat::parse("!x3xB").unwrap();
    assert_eq!(format.size(), 5);
    assert_eq!(format.field_count(), 1);
    let mut queue = BufferQueue::new();
    queue.push("....\x07");
    assert_eq!(queue.pop_struct_with(&format).unwrap(), [StructValue::UInt(7)]);
}

#[test]
fn value_accessors() {
    assert_eq!(StructValue::UInt(u64::MAX).as_i64(), None);
    assert_eq!(StructValue::Int(-1).as_u64(), None);
    assert_eq!(StructValue::Int(5).as_u64(), Some(5));
    assert_eq!(StructValue::Bool(true).as_f64(), None);
    assert_eq!(StructValue::Float(0.5).as_f64(), Some(0.5));
}
