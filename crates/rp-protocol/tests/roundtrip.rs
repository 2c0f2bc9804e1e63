//! Encode/decode round-trip coverage across the representable value space

use std::io::Cursor;

use rp_protocol::{Decoder, Encoder, Value, WireError};

fn roundtrip(value: &Value) -> Value {
    let mut buf = Vec::new();
    Encoder::new(&mut buf)
        .write_value(value)
        .expect("encode failed");
    Decoder::new(Cursor::new(buf))
        .read_value()
        .expect("decode failed")
}

#[test]
fn atoms_roundtrip() {
    for value in [Value::Null, Value::Bool(false), Value::Bool(true)] {
        assert_eq!(roundtrip(&value), value);
    }
}

#[test]
fn integers_roundtrip_across_the_full_range() {
    let mut samples = vec![i64::MIN, i64::MIN + 1, i64::MAX - 1, i64::MAX, 0, 1, -1];
    for shift in 0..63 {
        samples.push(1 << shift);
        samples.push(-(1i64 << shift));
        samples.push((1 << shift) - 1);
        samples.push((1 << shift) + 1);
    }
    for value in samples {
        assert_eq!(roundtrip(&Value::Int(value)), Value::Int(value), "value {}", value);
    }
}

#[test]
fn byte_payloads_roundtrip_with_arbitrary_content() {
    for len in [0usize, 1, 2, 7, 127, 128, 255, 4096] {
        // Deterministic but non-trivial byte pattern, including zeros
        let bytes: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
        for value in [
            Value::symbol_bytes(bytes.clone()),
            Value::string_bytes(bytes.clone()),
            Value::bytevector(bytes.clone()),
        ] {
            assert_eq!(roundtrip(&value), value, "len {}", len);
        }
    }
}

#[test]
fn pairs_and_vectors_roundtrip_nested() {
    let leaf = Value::list([
        Value::symbol("row"),
        Value::string("alpha"),
        Value::Null,
        Value::Int(-42),
    ]);

    let mut nested = leaf.clone();
    for depth in 0..60 {
        nested = Value::pair(Value::Int(depth), nested);
        assert_eq!(roundtrip(&nested), nested, "depth {}", depth);
    }

    let mut vector = leaf;
    for depth in 0..60 {
        vector = Value::vector(vec![Value::Bool(depth % 2 == 0), vector]);
    }
    assert_eq!(roundtrip(&vector), vector);
}

#[test]
fn improper_pairs_roundtrip() {
    let improper = Value::pair(
        Value::symbol("a"),
        Value::pair(Value::symbol("b"), Value::Int(3)),
    );
    assert_eq!(roundtrip(&improper), improper);
}

#[test]
fn empty_vector_and_empty_bytes_roundtrip() {
    assert_eq!(roundtrip(&Value::vector(vec![])), Value::vector(vec![]));
    assert_eq!(roundtrip(&Value::symbol("")), Value::symbol(""));
}

#[test]
fn trailing_garbage_is_left_on_the_stream() {
    let mut buf = Vec::new();
    Encoder::new(&mut buf).write_value(&Value::Int(7)).unwrap();
    buf.push(0x06); // unknown tag, must only fail the *next* read
    let mut decoder = Decoder::new(Cursor::new(buf));
    assert_eq!(decoder.read_value().unwrap(), Value::Int(7));
    assert!(matches!(decoder.read_value(), Err(WireError::UnknownTag(0x6))));
}
