use std::io::{self, BufRead, BufReader, Read};

/// A fixed-capacity window over a byte stream.
///
/// The unconsumed bytes currently held in memory are given by
/// [`InputBuffer::fill_buf`] and are refilled from the wrapped reader only
/// when everything has been consumed.
pub(crate) struct InputBuffer<R> {
    inner: BufReader<R>,
}

impl<R: Read> InputBuffer<R> {
    pub(crate) fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity.max(1), reader),
        }
    }

    /// Return the unconsumed bytes, reading from the underlying stream if
    /// none are left. An empty slice means the stream is exhausted.
    ///
    /// Interrupted reads are transparently retried.
    #[inline]
    pub(crate) fn fill_buf(&mut self) -> io::Result<&[u8]> {
        loop {
            match self.inner.fill_buf() {
                Ok(_) => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(self.inner.buffer())
    }

    #[inline(always)]
    pub(crate) fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    #[inline(always)]
    pub(crate) fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    struct Flaky<'a> {
        data: &'a [u8],
        interrupted: bool,
    }

    impl Read for Flaky<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupted = !self.interrupted;

            if self.interrupted {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }

            let n = buf.len().min(self.data.len()).min(2);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];

            Ok(n)
        }
    }

    #[test]
    fn test_fill_and_consume() -> io::Result<()> {
        let mut buffer = InputBuffer::with_capacity(4, Cursor::new("abcdef"));

        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.fill_buf()?, b"abcd");
        buffer.consume(3);
        assert_eq!(buffer.fill_buf()?, b"d");
        buffer.consume(1);
        assert_eq!(buffer.fill_buf()?, b"ef");
        buffer.consume(2);
        assert_eq!(buffer.fill_buf()?, b"");
        assert_eq!(buffer.fill_buf()?, b"");

        Ok(())
    }

    #[test]
    fn test_interrupted_reads_are_retried() -> io::Result<()> {
        let mut buffer = InputBuffer::with_capacity(
            8,
            Flaky {
                data: b"xyz",
                interrupted: false,
            },
        );

        let mut collected = Vec::new();

        loop {
            let input = buffer.fill_buf()?;

            if input.is_empty() {
                break;
            }

            let len = input.len();
            collected.extend_from_slice(input);
            buffer.consume(len);
        }

        assert_eq!(collected, b"xyz");

        Ok(())
    }
}
