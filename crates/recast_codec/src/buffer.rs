//! In-memory primitive source.

use crate::error::CodecError;
use crate::source::{zigzag_decode, PrimitiveSource, SourceKind, MAX_VARINT_LEN};

/// A [`PrimitiveSource`] over bytes already in memory.
///
/// Generic over the buffer so it can borrow a slice or own a `Vec<u8>` or
/// `Arc<[u8]>`. Every read checks the remaining length up front, so a failed
/// read leaves the cursor where it was and never yields partial data.
#[derive(Debug, Clone)]
pub struct BufferSource<B> {
    buf: B,
    pos: usize,
}

impl<B: AsRef<[u8]>> BufferSource<B> {
    /// Creates a source positioned at the start of `buf`.
    pub fn new(buf: B) -> Self {
        Self { buf, pos: 0 }
    }

    /// Returns the number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.as_ref().len() - self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the unconsumed bytes.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.buf.as_ref()[self.pos..]
    }

    /// Consumes the source, returning the underlying buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }

    fn take(&mut self, len: usize) -> Result<&[u8], CodecError> {
        let available = self.remaining();
        if len > available {
            return Err(CodecError::Truncated {
                needed: len,
                available,
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf.as_ref()[start..start + len])
    }
}

impl<B: AsRef<[u8]>> PrimitiveSource for BufferSource<B> {
    fn read_fixed(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        let bytes = self.take(buf.len())?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    fn skip(&mut self, len: usize) -> Result<(), CodecError> {
        self.take(len).map(|_| ())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::InMemory
    }

    fn read_byte(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        self.take(len).map(<[u8]>::to_vec)
    }

    fn read_long(&mut self) -> Result<i64, CodecError> {
        let rest = &self.buf.as_ref()[self.pos..];
        let mut raw: u64 = 0;
        for (i, byte) in rest.iter().take(MAX_VARINT_LEN).enumerate() {
            raw |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                self.pos += i + 1;
                return Ok(zigzag_decode(raw));
            }
        }
        if rest.len() < MAX_VARINT_LEN {
            Err(CodecError::Truncated {
                needed: rest.len() + 1,
                available: rest.len(),
            })
        } else {
            Err(CodecError::InvalidVarint)
        }
    }
}
