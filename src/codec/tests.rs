//! Unit tests for the primitive codec layer.

use bytes::BytesMut;
use proptest::prelude::*;
use rstest::rstest;

use super::*;

fn encoded<T: Scalar>(value: T) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_scalar(value, &mut buf).expect("encode should succeed");
    buf.to_vec()
}

#[rstest]
#[case::u8(encoded(0xABu8), vec![0xAB])]
#[case::u16(encoded(0x1234u16), vec![0x34, 0x12])]
#[case::u32(encoded(0x1234_5678u32), vec![0x78, 0x56, 0x34, 0x12])]
#[case::i16(encoded(-2i16), vec![0xFE, 0xFF])]
#[case::bool_true(encoded(true), vec![0x01])]
#[case::bool_false(encoded(false), vec![0x00])]
fn scalars_encode_little_endian(#[case] actual: Vec<u8>, #[case] expected: Vec<u8>) {
    assert_eq!(actual, expected);
}

#[rstest]
fn u64_full_range_round_trips() {
    for value in [0u64, 1, u64::from(u32::MAX), u64::MAX] {
        let bytes = encoded(value);
        assert_eq!(bytes.len(), 8);
        assert_eq!(decode_scalar::<u64>(&bytes).expect("decode"), value);
    }
}

#[rstest]
#[case::short(2)]
#[case::long(6)]
fn wrong_width_is_a_decode_error(#[case] len: usize) {
    let err = decode_scalar::<u32>(&vec![0u8; len]).expect_err("must fail");
    assert_eq!(
        err,
        CodecError::WidthMismatch {
            expected: 4,
            actual: len
        }
    );
}

#[rstest]
#[case(f32::NAN)]
#[case(f32::INFINITY)]
#[case(f32::NEG_INFINITY)]
fn non_finite_floats_fail_encode(#[case] value: f32) {
    let mut buf = BytesMut::new();
    let err = encode_scalar(value, &mut buf).expect_err("must fail");
    assert_eq!(err.error_type(), "range");
    assert!(buf.is_empty(), "failed encode must not emit bytes");
}

#[rstest]
fn invalid_bool_byte_is_rejected() {
    let err = decode_scalar::<bool>(&[2]).expect_err("must fail");
    assert_eq!(err, CodecError::InvalidBool { byte: 2 });
}

#[rstest]
fn empty_scalar_array_round_trips() {
    let mut buf = BytesMut::new();
    encode_scalar_array::<u32>(&[], &mut buf).expect("encode");
    assert!(buf.is_empty());
    assert_eq!(decode_scalar_array::<u32>(&buf).expect("decode"), vec![]);
}

#[rstest]
fn ragged_scalar_array_is_rejected() {
    let err = decode_scalar_array::<u32>(&[0, 1, 2, 3, 4]).expect_err("must fail");
    assert_eq!(err, CodecError::RaggedArray { len: 5, width: 4 });
}

#[rstest]
fn invalid_utf8_is_a_typed_error() {
    let err = decode_str(&[0x66, 0x6F, 0xFF]).expect_err("must fail");
    assert_eq!(err, CodecError::Utf8 { valid_up_to: 2 });
}

#[rstest]
fn string_array_uses_length_prefixed_records() {
    let values = vec!["ab".to_owned(), String::new(), "c".to_owned()];
    let mut buf = BytesMut::new();
    encode_str_array(&values, &mut buf).expect("encode");
    assert_eq!(
        buf.to_vec(),
        vec![2, 0, 0, 0, b'a', b'b', 0, 0, 0, 0, 1, 0, 0, 0, b'c'],
    );
    assert_eq!(decode_str_array(&buf).expect("decode"), values);
}

#[rstest]
fn truncated_string_record_is_rejected() {
    // Prefix claims four bytes but only one follows.
    let err = decode_str_array(&[4, 0, 0, 0, b'x']).expect_err("must fail");
    assert_eq!(err, CodecError::TruncatedRecord { need: 4, have: 1 });
}

proptest! {
    #[test]
    fn scalar_round_trip_u32(value: u32) {
        prop_assert_eq!(decode_scalar::<u32>(&encoded(value)).unwrap(), value);
    }

    #[test]
    fn scalar_round_trip_i64(value: i64) {
        prop_assert_eq!(decode_scalar::<i64>(&encoded(value)).unwrap(), value);
    }

    #[test]
    fn scalar_round_trip_finite_f64(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        prop_assert_eq!(decode_scalar::<f64>(&encoded(value)).unwrap(), value);
    }

    #[test]
    fn string_round_trip(value in ".*") {
        let mut buf = BytesMut::new();
        encode_str(&value, &mut buf);
        prop_assert_eq!(decode_str(&buf).unwrap(), value);
    }

    #[test]
    fn scalar_array_round_trip(values: Vec<u16>) {
        let mut buf = BytesMut::new();
        encode_scalar_array(&values, &mut buf).unwrap();
        prop_assert_eq!(decode_scalar_array::<u16>(&buf).unwrap(), values);
    }

    #[test]
    fn string_array_round_trip(values: Vec<String>) {
        let mut buf = BytesMut::new();
        encode_str_array(&values, &mut buf).unwrap();
        prop_assert_eq!(decode_str_array(&buf).unwrap(), values);
    }
}
