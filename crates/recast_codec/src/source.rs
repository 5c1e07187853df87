//! The primitive byte source abstraction.

use crate::error::CodecError;

/// Maximum encoded length of a 64-bit varint.
pub(crate) const MAX_VARINT_LEN: usize = 10;

/// Growth step for [`PrimitiveSource::read_vec`] when the source cannot tell
/// how many bytes are left.
pub(crate) const READ_CHUNK: usize = 64 * 1024;

/// What kind of storage backs a [`PrimitiveSource`].
///
/// Callers use this to choose between the size-then-data fast path, which
/// pays off when bytes can be copied in bulk from memory, and generic
/// whole-value reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Random-access bytes already in memory.
    InMemory,
    /// A sequential stream pulled through a reader.
    Streaming,
}

impl SourceKind {
    /// Returns `true` for sources that serve fixed reads with a memory copy.
    pub fn is_bulk(self) -> bool {
        matches!(self, SourceKind::InMemory)
    }
}

/// A sequential reader of primitive values with an internal cursor.
///
/// Implementors provide fixed-length reads, skips, and their [`SourceKind`];
/// every other read is derived from those. Sources never seek backward.
pub trait PrimitiveSource {
    /// Fills `buf` completely from the source.
    fn read_fixed(&mut self, buf: &mut [u8]) -> Result<(), CodecError>;

    /// Advances past `len` bytes without returning them.
    fn skip(&mut self, len: usize) -> Result<(), CodecError>;

    /// Reports the storage kind. Has no side effect.
    fn kind(&self) -> SourceKind;

    /// Reads a single byte.
    fn read_byte(&mut self) -> Result<u8, CodecError> {
        let mut byte = [0u8; 1];
        self.read_fixed(&mut byte)?;
        Ok(byte[0])
    }

    /// Reads a zig-zag varint encoded 64-bit integer.
    fn read_long(&mut self) -> Result<i64, CodecError> {
        let mut raw: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_byte()?;
            raw |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(zigzag_decode(raw));
            }
        }
        Err(CodecError::InvalidVarint)
    }

    /// Reads a zig-zag varint and checks that it fits in 32 bits.
    fn read_int(&mut self) -> Result<i32, CodecError> {
        let value = self.read_long()?;
        i32::try_from(value).map_err(|_| CodecError::IntOutOfRange(value))
    }

    /// Reads a boolean byte.
    fn read_boolean(&mut self) -> Result<bool, CodecError> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBoolean(other)),
        }
    }

    /// Reads a little-endian IEEE 754 single.
    fn read_float(&mut self) -> Result<f32, CodecError> {
        let mut bytes = [0u8; 4];
        self.read_fixed(&mut bytes)?;
        Ok(f32::from_le_bytes(bytes))
    }

    /// Reads a little-endian IEEE 754 double.
    fn read_double(&mut self) -> Result<f64, CodecError> {
        let mut bytes = [0u8; 8];
        self.read_fixed(&mut bytes)?;
        Ok(f64::from_le_bytes(bytes))
    }

    /// Reads a length prefix: a long that must not be negative.
    fn read_len(&mut self) -> Result<usize, CodecError> {
        let value = self.read_long()?;
        if value < 0 {
            return Err(CodecError::NegativeLength(value));
        }
        Ok(usize::try_from(value).unwrap_or(usize::MAX))
    }

    /// Reads `len` bytes into a new vector.
    ///
    /// The buffer grows as bytes arrive, so a length prefix larger than the
    /// input never allocates more than one chunk past what was actually read.
    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(len.min(READ_CHUNK));
        while out.len() < len {
            let filled = out.len();
            let chunk = (len - filled).min(READ_CHUNK);
            out.resize(filled + chunk, 0);
            self.read_fixed(&mut out[filled..]).map_err(|e| match e {
                CodecError::Truncated { available, .. } => CodecError::Truncated {
                    needed: len,
                    available: filled + available,
                },
                other => other,
            })?;
        }
        Ok(out)
    }
}

impl<S: PrimitiveSource + ?Sized> PrimitiveSource for &mut S {
    fn read_fixed(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        (**self).read_fixed(buf)
    }

    fn skip(&mut self, len: usize) -> Result<(), CodecError> {
        (**self).skip(len)
    }

    fn kind(&self) -> SourceKind {
        (**self).kind()
    }

    fn read_byte(&mut self) -> Result<u8, CodecError> {
        (**self).read_byte()
    }

    fn read_long(&mut self) -> Result<i64, CodecError> {
        (**self).read_long()
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        (**self).read_vec(len)
    }
}

impl<S: PrimitiveSource + ?Sized> PrimitiveSource for Box<S> {
    fn read_fixed(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        (**self).read_fixed(buf)
    }

    fn skip(&mut self, len: usize) -> Result<(), CodecError> {
        (**self).skip(len)
    }

    fn kind(&self) -> SourceKind {
        (**self).kind()
    }

    fn read_byte(&mut self) -> Result<u8, CodecError> {
        (**self).read_byte()
    }

    fn read_long(&mut self) -> Result<i64, CodecError> {
        (**self).read_long()
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        (**self).read_vec(len)
    }
}

pub(crate) fn zigzag_decode(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}

pub(crate) fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_small_values() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_decode(3), -2);
        assert_eq!(zigzag_decode(4), 2);
    }

    #[test]
    fn zigzag_extremes() {
        assert_eq!(zigzag_decode(zigzag_encode(i64::MAX)), i64::MAX);
        assert_eq!(zigzag_decode(zigzag_encode(i64::MIN)), i64::MIN);
        assert_eq!(zigzag_encode(i64::MIN), u64::MAX);
    }

    /// Serves reads from a slice without reporting its length up front.
    struct Opaque<'a>(&'a [u8]);

    impl PrimitiveSource for Opaque<'_> {
        fn read_fixed(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
            if buf.len() > self.0.len() {
                return Err(CodecError::Truncated {
                    needed: buf.len(),
                    available: self.0.len(),
                });
            }
            let (head, tail) = self.0.split_at(buf.len());
            buf.copy_from_slice(head);
            self.0 = tail;
            Ok(())
        }

        fn skip(&mut self, len: usize) -> Result<(), CodecError> {
            self.read_vec(len).map(|_| ())
        }

        fn kind(&self) -> SourceKind {
            SourceKind::Streaming
        }
    }

    #[test]
    fn read_vec_spans_chunks() {
        let data: Vec<u8> = (0..READ_CHUNK * 2 + 7).map(|i| i as u8).collect();
        let mut src = Opaque(&data);
        assert_eq!(src.read_vec(data.len()).unwrap(), data);
        assert!(src.0.is_empty());
    }

    #[test]
    fn read_vec_truncation_reports_total_length() {
        let data = vec![1u8; READ_CHUNK + 3];
        let mut src = Opaque(&data);
        let err = src.read_vec(64 << 20).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Truncated { needed, available }
                if needed == 64 << 20 && available == READ_CHUNK + 3
        ));
    }

    #[test]
    fn source_kind_bulk() {
        assert!(SourceKind::InMemory.is_bulk());
        assert!(!SourceKind::Streaming.is_bulk());
    }
}
