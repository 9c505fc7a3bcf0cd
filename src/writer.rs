use std::error;
use std::fmt;
use std::io::{self, BufWriter, IntoInnerError, Write};
use std::mem;
use std::sync::Arc;

use memchr::{memchr, memchr3, memchr_iter};

use crate::records::ByteRecord;

const DEFAULT_BUFFER_CAPACITY: usize = 1 << 10;

/// Error returned by a [`Writer`] whose sink previously failed.
///
/// Its [`source`](std::error::Error::source) is the original failure.
#[derive(Debug, Clone)]
pub struct StickyError(Arc<io::Error>);

impl StickyError {
    /// Return the original sink failure.
    pub fn original(&self) -> &io::Error {
        &self.0
    }
}

impl fmt::Display for StickyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CSV writer sink previously failed: {}", self.0)
    }
}

impl error::Error for StickyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

#[inline]
fn replay(err: &Arc<io::Error>) -> io::Error {
    io::Error::new(err.kind(), StickyError(Arc::clone(err)))
}

// `io::Error` is not `Clone`: keep the OS error code when there is one, the
// kind & message otherwise.
fn duplicate(err: &io::Error) -> io::Error {
    match err.raw_os_error() {
        Some(code) => io::Error::from_raw_os_error(code),
        None => io::Error::new(err.kind(), err.to_string()),
    }
}

/// Builds a [`Writer`] with given configuration.
#[derive(Clone)]
pub struct WriterBuilder {
    delimiter: u8,
    quote: u8,
    crlf: bool,
    always_quote: bool,
    buffer_capacity: usize,
}

impl Default for WriterBuilder {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            crlf: false,
            always_quote: false,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl WriterBuilder {
    /// Create a new [`WriterBuilder`] with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`WriterBuilder`] with provided `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut writer = Self::default();
        writer.buffer_capacity(capacity);
        writer
    }

    /// Set the delimiter to be used by the created [`Writer`].
    ///
    /// Will default to a comma.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote char to be used by the created [`Writer`].
    ///
    /// Will default to a double quote.
    pub fn quote(&mut self, quote: u8) -> &mut Self {
        self.quote = quote;
        self
    }

    /// Indicate whether records should be terminated by CRLF instead of a
    /// single LF.
    ///
    /// Will default to `false`.
    pub fn crlf(&mut self, yes: bool) -> &mut Self {
        self.crlf = yes;
        self
    }

    /// Indicate whether every field should be quoted, even when not required.
    ///
    /// Will default to `false`.
    pub fn always_quote(&mut self, yes: bool) -> &mut Self {
        self.always_quote = yes;
        self
    }

    /// Set the capacity of the created [`Writer`]'s buffer.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Create a new [`Writer`] using the provided writer implementing
    /// [`std::io::Write`].
    pub fn from_writer<W: Write>(&self, writer: W) -> Writer<W> {
        Writer {
            delimiter: self.delimiter,
            quote: self.quote,
            crlf: self.crlf,
            always_quote: self.always_quote,
            buffer: BufWriter::with_capacity(self.buffer_capacity, writer),
            scratch: Vec::new(),
            err: None,
        }
    }
}

/// An already configured CSV writer.
///
/// Fields are quoted only when needed, i.e. when they contain the delimiter,
/// the quote char or a line terminator, unless configured otherwise.
///
/// The first I/O error raised by the sink is returned as is, and a copy of it
/// is kept by the writer: every subsequent write or flush fails with an error
/// of the same kind, wrapping a [`StickyError`], until [`Writer::reset`] is
/// called.
pub struct Writer<W: Write> {
    delimiter: u8,
    quote: u8,
    crlf: bool,
    always_quote: bool,
    buffer: BufWriter<W>,
    scratch: Vec<u8>,
    err: Option<Arc<io::Error>>,
}

impl<W: Write> Writer<W> {
    /// Create a new writer with default configuration using the provided
    /// writer implementing [`std::io::Write`].
    pub fn from_writer(writer: W) -> Self {
        WriterBuilder::new().from_writer(writer)
    }

    fn fail(&mut self, err: io::Error) -> io::Error {
        tracing::debug!("CSV writer sink failed: {}", err);

        self.err = Some(Arc::new(duplicate(&err)));

        err
    }

    #[inline]
    fn check(&self) -> io::Result<()> {
        match &self.err {
            Some(err) => Err(replay(err)),
            None => Ok(()),
        }
    }

    #[inline]
    fn must_quote(&self, cell: &[u8]) -> bool {
        self.always_quote
            || memchr3(self.delimiter, self.quote, b'\n', cell).is_some()
            || memchr(b'\r', cell).is_some()
    }

    fn push_cell(&mut self, cell: &[u8]) {
        if !self.must_quote(cell) {
            self.scratch.extend_from_slice(cell);
            return;
        }

        self.scratch.push(self.quote);

        let mut start = 0;

        for offset in memchr_iter(self.quote, cell) {
            self.scratch.extend_from_slice(&cell[start..=offset]);
            self.scratch.push(self.quote);
            start = offset + 1;
        }

        self.scratch.extend_from_slice(&cell[start..]);
        self.scratch.push(self.quote);
    }

    /// Write a single record made of the given fields.
    ///
    /// Written data is buffered and not necessarily flushed to the sink.
    pub fn write_record<I, T>(&mut self, record: I) -> io::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.check()?;

        self.scratch.clear();

        for (i, cell) in record.into_iter().enumerate() {
            if i > 0 {
                self.scratch.push(self.delimiter);
            }

            self.push_cell(cell.as_ref());
        }

        let terminator: &[u8] = if self.crlf { b"\r\n" } else { b"\n" };
        self.scratch.extend_from_slice(terminator);

        if let Err(err) = self.buffer.write_all(&self.scratch) {
            return Err(self.fail(err));
        }

        Ok(())
    }

    /// Write a single [`ByteRecord`].
    #[inline]
    pub fn write_byte_record(&mut self, record: &ByteRecord) -> io::Result<()> {
        self.write_record(record)
    }

    /// Write several records, stopping at the first error.
    pub fn write_all<I, R, T>(&mut self, records: I) -> io::Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        for record in records {
            self.write_record(record)?;
        }

        Ok(())
    }

    /// Flush buffered data to the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.check()?;

        if let Err(err) = self.buffer.flush() {
            return Err(self.fail(err));
        }

        Ok(())
    }

    /// Return the error that made the writer fail, if any.
    pub fn error(&self) -> Option<&io::Error> {
        self.err.as_deref()
    }

    /// Redirect the writer to a new sink, keeping its configuration.
    ///
    /// Data not yet flushed to the former sink is discarded and the stored
    /// error, if any, is cleared. The former sink is returned.
    pub fn reset(&mut self, writer: W) -> W {
        let capacity = self.buffer.capacity();
        let former = mem::replace(&mut self.buffer, BufWriter::with_capacity(capacity, writer));

        self.err = None;

        let (former, _discarded) = former.into_parts();

        former
    }

    /// Return a reference to the underlying writer.
    #[inline(always)]
    pub fn get_ref(&self) -> &W {
        self.buffer.get_ref()
    }

    /// Flush and return the underlying writer.
    ///
    /// This does not consult the stored error: buffered data is flushed to
    /// the sink one last time, and if this fails the returned
    /// [`IntoInnerError`] still gives the sink back.
    pub fn into_inner(self) -> Result<W, IntoInnerError<BufWriter<W>>> {
        self.buffer.into_inner()
    }
}
