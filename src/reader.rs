use std::borrow::Cow;
use std::io::Read;

use crate::buffer::InputBuffer;
use crate::core::{CoreReader, ReadResult};
use crate::error::{Error, ErrorKind, Position, Result};
use crate::records::{ByteRecord, ByteRecordBuilder};
use crate::writer::WriterBuilder;

pub(crate) const DEFAULT_BUFFER_CAPACITY: usize = 1 << 10;

/// Builds a [`Reader`] with given configuration.
#[derive(Clone)]
pub struct ReaderBuilder {
    delimiter: u8,
    quote: u8,
    buffer_capacity: usize,
    reuse_record: bool,
    expected_fields: usize,
    flexible: bool,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            reuse_record: false,
            expected_fields: 0,
            flexible: false,
        }
    }
}

impl ReaderBuilder {
    /// Create a new [`ReaderBuilder`] with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`ReaderBuilder`] with provided `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut reader = Self::default();
        reader.buffer_capacity(capacity);
        reader
    }

    /// Set the delimiter to be used by the created [`Reader`].
    ///
    /// This delimiter must be a single byte.
    ///
    /// Will default to a comma.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote char to be used by the created [`Reader`].
    ///
    /// This char must be a single byte.
    ///
    /// Will default to a double quote.
    pub fn quote(&mut self, quote: u8) -> &mut Self {
        self.quote = quote;
        self
    }

    /// Set the capacity of the created [`Reader`]'s input buffer.
    ///
    /// Records larger than this capacity are still supported, the buffer only
    /// bounds how much data is pulled from the stream at once.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Indicate whether the created [`Reader`] should lend its internal record
    /// instead of yielding a freshly allocated one each time.
    ///
    /// When enabled, [`Reader::read_record`] returns [`Cow::Borrowed`] records
    /// that remain valid only until the next call on the reader. Use
    /// [`Cow::into_owned`] to retain one.
    ///
    /// Will default to `false`.
    pub fn reuse_record(&mut self, yes: bool) -> &mut Self {
        self.reuse_record = yes;
        self
    }

    /// Set the number of fields every record is expected to have.
    ///
    /// `0` means the number of fields of the first record will be used.
    ///
    /// Will default to `0`.
    pub fn expected_fields(&mut self, len: usize) -> &mut Self {
        self.expected_fields = len;
        self
    }

    /// Indicate whether the created [`Reader`] should be "flexible",
    /// i.e. whether it should allow reading records having different number of
    /// fields than the first one.
    ///
    /// Will default to `false`.
    pub fn flexible(&mut self, yes: bool) -> &mut Self {
        self.flexible = yes;
        self
    }

    /// Create a [`WriterBuilder`] writing CSV data with the same delimiter &
    /// quote char as this builder.
    pub fn to_writer_builder(&self) -> WriterBuilder {
        let mut writer_builder = WriterBuilder::new();

        writer_builder
            .buffer_capacity(self.buffer_capacity)
            .delimiter(self.delimiter)
            .quote(self.quote);

        writer_builder
    }

    /// Create a new [`Reader`] using the provided reader implementing
    /// [`std::io::Read`].
    pub fn from_reader<R: Read>(&self, reader: R) -> Reader<R> {
        Reader {
            buffer: InputBuffer::with_capacity(self.buffer_capacity, reader),
            inner: CoreReader::new(self.delimiter, self.quote),
            record: ByteRecord::with_capacity(512, 32),
            reuse_record: self.reuse_record,
            flexible: self.flexible,
            expected_len: (self.expected_fields > 0).then_some(self.expected_fields),
            record_start: Position::default(),
            done: false,
        }
    }
}

/// An already configured streaming CSV reader.
///
/// Quoted data is unescaped on the fly. A quote found anywhere else than at
/// the very beginning of a field is considered an error, as is a quoted field
/// left open at the end of the stream. Both errors are fatal and the reader
/// will not yield any record afterwards.
///
/// # Configuration
///
/// To configure a [`Reader`], if you need a custom delimiter for instance or
/// if you want records to be lent instead of copied, check out the
/// [`ReaderBuilder`].
pub struct Reader<R> {
    buffer: InputBuffer<R>,
    inner: CoreReader,
    record: ByteRecord,
    reuse_record: bool,
    flexible: bool,
    expected_len: Option<usize>,
    record_start: Position,
    done: bool,
}

impl<R: Read> Reader<R> {
    /// Create a new reader with default configuration using the provided
    /// reader implementing [`std::io::Read`].
    ///
    /// Avoid providing a buffered reader because buffering will be handled for
    /// you by the [`Reader`].
    pub fn from_reader(reader: R) -> Self {
        ReaderBuilder::new().from_reader(reader)
    }

    fn fail(&mut self, kind: ErrorKind) -> Error {
        self.done = true;

        let err = Error::new(kind);
        tracing::debug!("stopped reading CSV stream: {}", err);

        err
    }

    #[inline]
    fn check_field_count(&mut self) -> Result<()> {
        if self.flexible {
            return Ok(());
        }

        let len = self.record.len();

        match self.expected_len {
            None => {
                self.expected_len = Some(len);
            }
            Some(expected_len) if expected_len != len => {
                tracing::debug!(
                    "record on line {} has {} fields instead of {}",
                    self.record_start.line,
                    len,
                    expected_len
                );

                return Err(Error::new(ErrorKind::UnequalLengths {
                    expected_len,
                    len,
                    pos: self.record_start,
                    record: self.record.clone(),
                }));
            }
            _ => (),
        }

        Ok(())
    }

    fn read_record_impl(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }

        self.record.clear();
        self.record_start = self.inner.position();

        let mut record_builder = ByteRecordBuilder::wrap(&mut self.record);

        let result = loop {
            let input = match self.buffer.fill_buf() {
                Ok(input) => input,
                Err(err) => break Err(err),
            };

            if input.is_empty() {
                self.done = true;
                break Ok(self.inner.finish(&mut record_builder));
            }

            let (result, pos) = self.inner.read_record(input, &mut record_builder);

            self.buffer.consume(pos);

            if result != ReadResult::InputEmpty {
                break Ok(result);
            }
        };

        match result {
            Err(err) => Err(self.fail(ErrorKind::Io(err))),
            Ok(ReadResult::Record) => Ok(true),
            Ok(ReadResult::BareQuote) => {
                let pos = self.inner.position();
                Err(self.fail(ErrorKind::BareQuote { pos }))
            }
            Ok(ReadResult::UnterminatedQuote) => {
                let pos = self.inner.position();
                Err(self.fail(ErrorKind::UnterminatedQuote { pos }))
            }
            Ok(ReadResult::End | ReadResult::InputEmpty) => {
                tracing::trace!("reached end of CSV stream on line {}", self.record_start.line);
                Ok(false)
            }
        }
    }

    /// Attempt to read the next record from the underlying reader.
    ///
    /// Will return `None` if the end of stream was reached, or if a fatal
    /// error was previously returned.
    ///
    /// Records are given as [`Cow::Owned`] unless the reader was configured
    /// with [`ReaderBuilder::reuse_record`], in which case they are given as
    /// [`Cow::Borrowed`] from the reader's internal storage.
    ///
    /// If the record does not have the expected number of fields, an
    /// [`ErrorKind::UnequalLengths`] error is returned, carrying the record.
    /// This error is not fatal and the reader can still be used afterwards.
    pub fn read_record(&mut self) -> Result<Option<Cow<'_, ByteRecord>>> {
        if !self.read_record_impl()? {
            return Ok(None);
        }

        self.check_field_count()?;

        Ok(Some(if self.reuse_record {
            Cow::Borrowed(&self.record)
        } else {
            Cow::Owned(self.record.clone())
        }))
    }

    /// Read every remaining record.
    ///
    /// Any error, including a non-fatal [`ErrorKind::UnequalLengths`] one,
    /// aborts the process and only the error is returned.
    pub fn read_all(&mut self) -> Result<Vec<ByteRecord>> {
        self.byte_records().collect()
    }

    /// Return an iterator over the reader's owned records.
    pub fn byte_records(&mut self) -> ByteRecordsIter<'_, R> {
        ByteRecordsIter { reader: self }
    }

    /// Convert the reader into an iterator over its owned records.
    pub fn into_byte_records(self) -> ByteRecordsIntoIter<R> {
        ByteRecordsIntoIter { reader: self }
    }

    /// Return the number of fields records are expected to have, if already
    /// known.
    #[inline(always)]
    pub fn expected_fields(&self) -> Option<usize> {
        self.expected_len
    }

    /// Return the current position of the reader in the stream.
    #[inline(always)]
    pub fn position(&self) -> Position {
        self.inner.position()
    }

    /// Return whether the reader will not yield any more record.
    #[inline(always)]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Return the capacity of the reader's input buffer.
    #[inline(always)]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Return a reference to the underlying reader.
    #[inline(always)]
    pub fn get_ref(&self) -> &R {
        self.buffer.get_ref()
    }

    /// Return the underlying reader.
    ///
    /// **BEWARE**: Already buffered data will be lost!
    pub fn into_inner(self) -> R {
        self.buffer.into_inner()
    }
}

pub struct ByteRecordsIter<'r, R> {
    reader: &'r mut Reader<R>,
}

impl<R: Read> Iterator for ByteRecordsIter<'_, R> {
    type Item = Result<ByteRecord>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.reader
            .read_record()
            .transpose()
            .map(|result| result.map(Cow::into_owned))
    }
}

pub struct ByteRecordsIntoIter<R> {
    reader: Reader<R>,
}

impl<R: Read> Iterator for ByteRecordsIntoIter<R> {
    type Item = Result<ByteRecord>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.reader
            .read_record()
            .transpose()
            .map(|result| result.map(Cow::into_owned))
    }
}
