//! Binary encoder, the writer side of [`PrimitiveSource`](crate::PrimitiveSource).

use crate::source::zigzag_encode;

/// Appends primitive values to a byte buffer in the compact binary encoding.
///
/// Composite values are written by the caller: a record is its fields in
/// order, a union is [`write_index`](Self::write_index) followed by the branch
/// value, and arrays and maps are blocks introduced by
/// [`write_count`](Self::write_count) and closed by
/// [`write_end`](Self::write_end).
#[derive(Debug, Default, Clone)]
pub struct BinaryEncoder {
    buf: Vec<u8>,
}

impl BinaryEncoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes nothing; null occupies zero bytes.
    pub fn write_null(&mut self) {}

    /// Writes a boolean as a single 0 or 1 byte.
    pub fn write_boolean(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Writes a 32-bit integer as a zig-zag varint.
    pub fn write_int(&mut self, value: i32) {
        self.write_long(i64::from(value));
    }

    /// Writes a 64-bit integer as a zig-zag varint.
    pub fn write_long(&mut self, value: i64) {
        let mut raw = zigzag_encode(value);
        while raw >= 0x80 {
            self.buf.push((raw as u8) | 0x80);
            raw >>= 7;
        }
        self.buf.push(raw as u8);
    }

    /// Writes a little-endian IEEE 754 single.
    pub fn write_float(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian IEEE 754 double.
    pub fn write_double(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a length-prefixed byte sequence.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_long(value.len() as i64);
        self.buf.extend_from_slice(value);
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Writes bytes with no length prefix.
    pub fn write_fixed(&mut self, value: &[u8]) {
        self.buf.extend_from_slice(value);
    }

    /// Writes an enum ordinal.
    pub fn write_enum(&mut self, ordinal: u32) {
        self.write_long(i64::from(ordinal));
    }

    /// Writes a union branch tag.
    pub fn write_index(&mut self, index: u32) {
        self.write_long(i64::from(index));
    }

    /// Starts an array or map block of `count` items.
    pub fn write_count(&mut self, count: usize) {
        self.write_long(count as i64);
    }

    /// Starts a block of `count` items that also declares its byte size, which
    /// lets readers skip the block without decoding it.
    pub fn write_sized_count(&mut self, count: usize, byte_size: usize) {
        self.write_long(-(count as i64));
        self.write_long(byte_size as i64);
    }

    /// Terminates an array or map.
    pub fn write_end(&mut self) {
        self.write_long(0);
    }

    /// Returns the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the encoder, returning its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferSource;
    use crate::source::PrimitiveSource;
    use proptest::prelude::*;

    #[test]
    fn long_encoding_matches_known_bytes() {
        let cases: [(i64, &[u8]); 6] = [
            (0, &[0x00]),
            (-1, &[0x01]),
            (1, &[0x02]),
            (-64, &[0x7f]),
            (64, &[0x80, 0x01]),
            (30, &[0x3c]),
        ];
        for (value, expected) in cases {
            let mut enc = BinaryEncoder::new();
            enc.write_long(value);
            assert_eq!(enc.as_bytes(), expected, "encoding of {value}");
        }
    }

    #[test]
    fn string_is_length_prefixed() {
        let mut enc = BinaryEncoder::new();
        enc.write_string("Alice");
        assert_eq!(enc.as_bytes(), b"\x0aAlice");
        assert_eq!(enc.len(), 6);
    }

    #[test]
    fn sized_block_header() {
        let mut enc = BinaryEncoder::new();
        enc.write_sized_count(2, 4);
        assert_eq!(enc.as_bytes(), &[0x03, 0x08]);
    }

    #[test]
    fn null_writes_nothing() {
        let mut enc = BinaryEncoder::new();
        enc.write_null();
        assert!(enc.is_empty());
    }

    proptest! {
        #[test]
        fn any_long_reads_back(value in any::<i64>()) {
            let mut enc = BinaryEncoder::new();
            enc.write_long(value);
            let mut src = BufferSource::new(enc.into_bytes());
            prop_assert_eq!(src.read_long().unwrap(), value);
            prop_assert!(src.is_exhausted());
        }
    }
}
