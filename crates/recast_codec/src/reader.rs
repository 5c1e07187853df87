//! Streaming primitive source over [`std::io::Read`].

use std::io::{ErrorKind, Read};

use crate::error::CodecError;
use crate::source::{PrimitiveSource, SourceKind};

/// Chunk size used when skipping bytes on a stream.
const SKIP_CHUNK: usize = 4096;

/// A [`PrimitiveSource`] that pulls bytes from an [`io::Read`](std::io::Read).
///
/// End of stream in the middle of a read surfaces as
/// [`CodecError::Truncated`]; any other reader failure surfaces as
/// [`CodecError::Io`]. Bytes already pulled before a failure are lost, as
/// with any stream.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> ReaderSource<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    /// Returns the number of bytes pulled from the reader so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Returns a reference to the wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consumes the source, returning the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(CodecError::Truncated {
                        needed: buf.len(),
                        available: filled,
                    })
                }
                Ok(n) => {
                    filled += n;
                    self.consumed += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CodecError::Io(e)),
            }
        }
        Ok(())
    }
}

impl<R: Read> PrimitiveSource for ReaderSource<R> {
    fn read_fixed(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        self.fill(buf)
    }

    fn skip(&mut self, len: usize) -> Result<(), CodecError> {
        let mut scratch = [0u8; SKIP_CHUNK];
        let mut left = len;
        while left > 0 {
            let chunk = left.min(SKIP_CHUNK);
            self.fill(&mut scratch[..chunk]).map_err(|e| match e {
                CodecError::Truncated { available, .. } => CodecError::Truncated {
                    needed: len,
                    available: len - left + available,
                },
                other => other,
            })?;
            left -= chunk;
        }
        Ok(())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Streaming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BinaryEncoder;
    use std::io::Cursor;

    /// Yields at most one byte per `read` call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((first, rest)), Some(slot)) => {
                    *slot = *first;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn reads_across_short_reads() {
        let mut enc = BinaryEncoder::new();
        enc.write_long(-300);
        enc.write_double(2.5);
        let bytes = enc.into_bytes();

        let mut src = ReaderSource::new(Trickle(&bytes));
        assert_eq!(src.read_long().unwrap(), -300);
        assert_eq!(src.read_double().unwrap(), 2.5);
        assert_eq!(src.bytes_consumed(), bytes.len() as u64);
    }

    #[test]
    fn end_of_stream_is_truncation() {
        let mut src = ReaderSource::new(Cursor::new(vec![1u8, 2, 3]));
        let mut buf = [0u8; 10];
        match src.read_fixed(&mut buf) {
            Err(CodecError::Truncated { needed, available }) => {
                assert_eq!(needed, 10);
                assert_eq!(available, 3);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn skip_spans_chunks() {
        let data = vec![7u8; SKIP_CHUNK * 2 + 5];
        let mut src = ReaderSource::new(Cursor::new(data));
        src.skip(SKIP_CHUNK * 2 + 4).unwrap();
        assert_eq!(src.read_byte().unwrap(), 7);
        assert!(matches!(
            src.skip(1),
            Err(CodecError::Truncated {
                needed: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn io_errors_propagate() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(ErrorKind::ConnectionReset, "reset"))
            }
        }
        let mut src = ReaderSource::new(Broken);
        assert!(matches!(src.read_byte(), Err(CodecError::Io(_))));
        assert_eq!(src.kind(), SourceKind::Streaming);
    }
}
