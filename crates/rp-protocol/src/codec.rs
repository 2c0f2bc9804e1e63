//! Binary codec for value trees
//!
//! Every value on the wire starts with an unsigned base-128 varint
//! ("raw size") that doubles as the structural tag, least-significant
//! 7-bit group first, continuation in the high bit. The tag table is a
//! byte-for-byte interoperability contract:
//!
//! | tag | meaning       | payload                         |
//! |-----|---------------|---------------------------------|
//! | 0x0 | null          | -                               |
//! | 0x1 | false         | -                               |
//! | 0x2 | true          | -                               |
//! | 0x3 | bytevector    | length, raw bytes               |
//! | 0x4 | int >= 0      | unsigned magnitude              |
//! | 0x5 | int < 0       | unsigned magnitude (negated)    |
//! | 0xc | pair          | encoded head, encoded tail      |
//! | 0xd | vector        | count, encoded elements         |
//! | 0xe | string        | length, raw bytes               |
//! | 0xf | symbol        | length, raw bytes               |

use std::io::{self, Read, Write};

use bytes::Bytes;

use crate::error::WireError;
use crate::value::Value;

const TAG_NULL: u64 = 0x0;
const TAG_FALSE: u64 = 0x1;
const TAG_TRUE: u64 = 0x2;
const TAG_BYTEVECTOR: u64 = 0x3;
const TAG_INT_NONNEG: u64 = 0x4;
const TAG_INT_NEG: u64 = 0x5;
const TAG_PAIR: u64 = 0xc;
const TAG_VECTOR: u64 = 0xd;
const TAG_STRING: u64 = 0xe;
const TAG_SYMBOL: u64 = 0xf;

/// Default maximum nesting depth for encode and decode
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default maximum byte length / element count (16MB - 1)
pub const DEFAULT_MAX_BYTES: usize = 0x00FF_FFFF;

/// Resource limits enforced by the codec.
///
/// Decode recursion depth tracks value nesting, so pathological input
/// could otherwise exhaust the call stack; lengths bound allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth before a value is rejected
    pub max_depth: usize,
    /// Maximum length of a byte payload or vector element count
    pub max_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Decoder reading value trees from a blocking byte source
#[derive(Debug)]
pub struct Decoder<R> {
    source: R,
    limits: Limits,
}

impl<R: Read> Decoder<R> {
    /// Create a decoder with default limits
    pub fn new(source: R) -> Self {
        Self::with_limits(source, Limits::default())
    }

    /// Create a decoder with explicit limits
    pub fn with_limits(source: R, limits: Limits) -> Self {
        Self { source, limits }
    }

    /// Read one complete value.
    ///
    /// Returns `WireError::Eof` when the stream ends cleanly before
    /// the first tag byte, so callers can distinguish an orderly
    /// shutdown from a truncated value.
    pub fn read_value(&mut self) -> Result<Value, WireError> {
        let tag = self.read_tag_or_eof()?;
        self.read_tagged(tag, 0)
    }

    fn read_nested(&mut self, depth: usize) -> Result<Value, WireError> {
        if depth > self.limits.max_depth {
            return Err(WireError::DepthExceeded(self.limits.max_depth));
        }
        let tag = self.read_raw_size(0, u64::MAX)?;
        self.read_tagged(tag, depth)
    }

    fn read_tagged(&mut self, tag: u64, depth: usize) -> Result<Value, WireError> {
        match tag {
            TAG_NULL => Ok(Value::Null),
            TAG_FALSE => Ok(Value::Bool(false)),
            TAG_TRUE => Ok(Value::Bool(true)),
            TAG_BYTEVECTOR => Ok(Value::Bytevector(self.read_raw_bytes()?)),
            TAG_INT_NONNEG => {
                let magnitude = self.read_raw_size(0, i64::MAX as u64)?;
                Ok(Value::Int(magnitude as i64))
            }
            TAG_INT_NEG => {
                // Magnitude may be 2^63, the absolute value of i64::MIN
                let magnitude = self.read_raw_size(0, 1 << 63)?;
                Ok(Value::Int((magnitude as i64).wrapping_neg()))
            }
            TAG_PAIR => {
                // A failed tail decode drops the already-decoded head
                let head = self.read_nested(depth + 1)?;
                let tail = self.read_nested(depth + 1)?;
                Ok(Value::pair(head, tail))
            }
            TAG_VECTOR => {
                let count = self.read_raw_size(0, self.limits.max_bytes as u64)? as usize;
                // The declared count is untrusted; cap preallocation
                let mut elements = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    // A failed element decode drops everything read so far
                    elements.push(self.read_nested(depth + 1)?);
                }
                Ok(Value::Vector(elements))
            }
            TAG_STRING => Ok(Value::Str(self.read_raw_bytes()?)),
            TAG_SYMBOL => Ok(Value::Symbol(self.read_raw_bytes()?)),
            unknown => Err(WireError::UnknownTag(unknown)),
        }
    }

    fn read_raw_bytes(&mut self) -> Result<Bytes, WireError> {
        let len = self.read_raw_size(0, self.limits.max_bytes as u64)? as usize;
        let mut buf = vec![0u8; len];
        self.source.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn read_byte(&mut self) -> Result<u8, WireError> {
        let mut buf = [0u8; 1];
        self.source.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read the leading tag varint of a top-level value, mapping end
    /// of stream on its very first byte to `WireError::Eof`.
    fn read_tag_or_eof(&mut self) -> Result<u64, WireError> {
        let mut buf = [0u8; 1];
        if let Err(err) = self.source.read_exact(&mut buf) {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                return Err(WireError::Eof);
            }
            return Err(WireError::Io(err));
        }
        self.finish_raw_size(buf[0])
    }

    fn read_raw_size(&mut self, min: u64, max: u64) -> Result<u64, WireError> {
        let first = self.read_byte()?;
        let value = self.finish_raw_size(first)?;
        if value < min || value > max {
            return Err(WireError::SizeOutOfRange { value, min, max });
        }
        Ok(value)
    }

    /// Decode a base-128 varint whose first byte is already in hand,
    /// rejecting any encoding that overflows 64 bits.
    fn finish_raw_size(&mut self, first: u8) -> Result<u64, WireError> {
        let mut value = u64::from(first & 0x7f);
        let mut byte = first;
        let mut shift = 0u32;
        while byte & 0x80 != 0 {
            shift += 7;
            byte = self.read_byte()?;
            let group = u64::from(byte & 0x7f);
            match shift {
                0..=56 => value |= group << shift,
                63 if group <= 1 => value |= group << 63,
                _ => return Err(WireError::SizeOverflow),
            }
        }
        Ok(value)
    }
}

/// Encoder writing value trees to a blocking byte sink
#[derive(Debug)]
pub struct Encoder<W> {
    sink: W,
    limits: Limits,
}

impl<W: Write> Encoder<W> {
    /// Create an encoder with default limits
    pub fn new(sink: W) -> Self {
        Self::with_limits(sink, Limits::default())
    }

    /// Create an encoder with explicit limits
    pub fn with_limits(sink: W, limits: Limits) -> Self {
        Self { sink, limits }
    }

    /// Write one complete value and flush the sink.
    ///
    /// Writes pass straight through to the sink; a flush failure is
    /// reported distinctly from earlier write errors.
    pub fn write_value(&mut self, value: &Value) -> Result<(), WireError> {
        self.write_nested(value, 0)?;
        self.sink.flush().map_err(WireError::Flush)
    }

    fn write_nested(&mut self, value: &Value, depth: usize) -> Result<(), WireError> {
        if depth > self.limits.max_depth {
            return Err(WireError::DepthExceeded(self.limits.max_depth));
        }
        match value {
            Value::Null => self.write_raw_size(TAG_NULL),
            Value::Bool(false) => self.write_raw_size(TAG_FALSE),
            Value::Bool(true) => self.write_raw_size(TAG_TRUE),
            Value::Int(n) if *n >= 0 => {
                // Zero always takes the non-negative tag
                self.write_raw_size(TAG_INT_NONNEG)?;
                self.write_raw_size(*n as u64)
            }
            Value::Int(n) => {
                self.write_raw_size(TAG_INT_NEG)?;
                self.write_raw_size(n.unsigned_abs())
            }
            Value::Pair(head, tail) => {
                self.write_raw_size(TAG_PAIR)?;
                self.write_nested(head, depth + 1)?;
                self.write_nested(tail, depth + 1)
            }
            Value::Vector(elements) => {
                self.write_raw_size(TAG_VECTOR)?;
                self.write_raw_size(elements.len() as u64)?;
                for element in elements {
                    self.write_nested(element, depth + 1)?;
                }
                Ok(())
            }
            Value::Bytevector(bytes) => self.write_tagged_bytes(TAG_BYTEVECTOR, bytes),
            Value::Str(bytes) => self.write_tagged_bytes(TAG_STRING, bytes),
            Value::Symbol(bytes) => self.write_tagged_bytes(TAG_SYMBOL, bytes),
        }
    }

    fn write_tagged_bytes(&mut self, tag: u64, bytes: &[u8]) -> Result<(), WireError> {
        self.write_raw_size(tag)?;
        self.write_raw_size(bytes.len() as u64)?;
        self.sink.write_all(bytes)?;
        Ok(())
    }

    fn write_raw_size(&mut self, mut value: u64) -> Result<(), WireError> {
        // At most 10 groups of 7 bits for a 64-bit value
        let mut buf = [0u8; 10];
        let mut len = 0;
        while value > 0x7f {
            buf[len] = 0x80 | (value as u8 & 0x7f);
            value >>= 7;
            len += 1;
        }
        buf[len] = value as u8;
        len += 1;
        self.sink.write_all(&buf[..len])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_value(value).unwrap();
        buf
    }

    fn decode(bytes: &[u8]) -> Result<Value, WireError> {
        Decoder::new(Cursor::new(bytes)).read_value()
    }

    fn raw_size_bytes(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_raw_size(value).unwrap();
        buf
    }

    #[test]
    fn test_varint_boundary_lengths() {
        assert_eq!(raw_size_bytes(0).len(), 1);
        assert_eq!(raw_size_bytes(127).len(), 1);
        assert_eq!(raw_size_bytes(128).len(), 2);
        assert_eq!(raw_size_bytes(16383).len(), 2);
        assert_eq!(raw_size_bytes(16384).len(), 3);
        // 63 significant bits fit in 9 groups of 7
        assert_eq!(raw_size_bytes((1 << 63) - 1).len(), 9);
        // The 64th bit needs a 10th group
        assert_eq!(raw_size_bytes(1 << 63).len(), 10);
        assert_eq!(raw_size_bytes(u64::MAX).len(), 10);
    }

    #[test]
    fn test_varint_wire_bytes() {
        assert_eq!(raw_size_bytes(0), vec![0x00]);
        assert_eq!(raw_size_bytes(127), vec![0x7f]);
        assert_eq!(raw_size_bytes(128), vec![0x80, 0x01]);
        assert_eq!(raw_size_bytes(16384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn test_varint_roundtrip() {
        for value in [0u64, 1, 127, 128, 16383, 16384, 1 << 62, u64::MAX] {
            let buf = raw_size_bytes(value);
            let mut decoder = Decoder::new(Cursor::new(buf));
            assert_eq!(decoder.read_raw_size(0, u64::MAX).unwrap(), value);
        }
    }

    #[test]
    fn test_varint_overflow_rejected() {
        // Eleven continuation groups can only encode past 64 bits
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut decoder = Decoder::new(Cursor::new(&bytes[..]));
        assert!(matches!(
            decoder.read_raw_size(0, u64::MAX),
            Err(WireError::SizeOverflow)
        ));

        // Tenth group with more than the 64th bit set
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x02];
        let mut decoder = Decoder::new(Cursor::new(&bytes[..]));
        assert!(matches!(
            decoder.read_raw_size(0, u64::MAX),
            Err(WireError::SizeOverflow)
        ));
    }

    #[test]
    fn test_zero_takes_nonnegative_tag() {
        let buf = encode(&Value::Int(0));
        assert_eq!(buf, vec![0x04, 0x00]);
    }

    #[test]
    fn test_negative_one_roundtrip() {
        let buf = encode(&Value::Int(-1));
        assert_eq!(buf, vec![0x05, 0x01]);
        assert_eq!(decode(&buf).unwrap(), Value::Int(-1));
    }

    #[test]
    fn test_int64_extremes_roundtrip() {
        for value in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX - 1, i64::MAX] {
            let buf = encode(&Value::Int(value));
            assert_eq!(decode(&buf).unwrap(), Value::Int(value), "value {}", value);
        }
    }

    #[test]
    fn test_atom_wire_bytes() {
        assert_eq!(encode(&Value::Null), vec![0x00]);
        assert_eq!(encode(&Value::Bool(false)), vec![0x01]);
        assert_eq!(encode(&Value::Bool(true)), vec![0x02]);
        assert_eq!(encode(&Value::symbol("ok")), vec![0x0f, 0x02, b'o', b'k']);
        assert_eq!(encode(&Value::string("a")), vec![0x0e, 0x01, b'a']);
        assert_eq!(
            encode(&Value::bytevector(&[0xffu8, 0x00][..])),
            vec![0x03, 0x02, 0xff, 0x00]
        );
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        // 0x6 is unassigned in the tag table
        assert!(matches!(decode(&[0x06]), Err(WireError::UnknownTag(0x6))));
        // Tags above the table are equally fatal
        assert!(matches!(decode(&[0x10]), Err(WireError::UnknownTag(0x10))));
    }

    #[test]
    fn test_clean_eof_at_value_boundary() {
        assert!(matches!(decode(&[]), Err(WireError::Eof)));
    }

    #[test]
    fn test_truncated_value_is_io_error() {
        // String of declared length 5 with only 2 payload bytes
        let result = decode(&[0x0e, 0x05, b'h', b'i']);
        assert!(matches!(result, Err(WireError::Io(_))));
    }

    #[test]
    fn test_partial_vector_failure_propagates_original_error() {
        // Vector of 5 declared elements: two good ints, then an
        // unknown tag. The error must come through unchanged and the
        // two decoded elements are dropped, not leaked.
        let bytes = [0x0d, 0x05, 0x04, 0x01, 0x04, 0x02, 0x06];
        assert!(matches!(decode(&bytes), Err(WireError::UnknownTag(0x6))));
    }

    #[test]
    fn test_partial_pair_failure_propagates_original_error() {
        // Pair whose head decodes but whose tail is truncated
        let bytes = [0x0c, 0x04, 0x07];
        assert!(matches!(decode(&bytes), Err(WireError::Io(_))));
    }

    #[test]
    fn test_length_bound_enforced() {
        let limits = Limits {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: 4,
        };
        let buf = encode(&Value::string("too long"));
        let mut decoder = Decoder::with_limits(Cursor::new(buf), limits);
        assert!(matches!(
            decoder.read_value(),
            Err(WireError::SizeOutOfRange { value: 8, .. })
        ));
    }

    #[test]
    fn test_depth_limit_on_decode() {
        let mut deep = Value::Null;
        for _ in 0..10 {
            deep = Value::pair(Value::Int(1), deep);
        }
        let buf = encode(&deep);
        let limits = Limits {
            max_depth: 4,
            max_bytes: DEFAULT_MAX_BYTES,
        };
        let mut decoder = Decoder::with_limits(Cursor::new(buf), limits);
        assert!(matches!(
            decoder.read_value(),
            Err(WireError::DepthExceeded(4))
        ));
    }

    #[test]
    fn test_depth_limit_on_encode() {
        let mut deep = Value::Null;
        for _ in 0..10 {
            deep = Value::pair(Value::Int(1), deep);
        }
        let limits = Limits {
            max_depth: 4,
            max_bytes: DEFAULT_MAX_BYTES,
        };
        let mut buf = Vec::new();
        let mut encoder = Encoder::with_limits(&mut buf, limits);
        assert!(matches!(
            encoder.write_value(&deep),
            Err(WireError::DepthExceeded(4))
        ));
    }

    #[test]
    fn test_consecutive_values_on_one_stream() {
        let mut buf = Vec::new();
        {
            let mut encoder = Encoder::new(&mut buf);
            encoder.write_value(&Value::Int(1)).unwrap();
            encoder.write_value(&Value::symbol("two")).unwrap();
        }
        let mut decoder = Decoder::new(Cursor::new(buf));
        assert_eq!(decoder.read_value().unwrap(), Value::Int(1));
        assert_eq!(decoder.read_value().unwrap(), Value::symbol("two"));
        assert!(matches!(decoder.read_value(), Err(WireError::Eof)));
    }
}
