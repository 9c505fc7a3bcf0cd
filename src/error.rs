use std::{error, fmt, io, result};

use crate::records::ByteRecord;

/// A 1-based location in the parsed stream.
///
/// Lines are counted on every line terminator, including the ones found
/// inside quoted fields. Columns are counted in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: u64,
    /// Column number (in bytes), starting at 1.
    pub column: u64,
}

impl Position {
    #[inline]
    pub(crate) fn new(line: u64, column: u64) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The specific type of an error.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Wrap a [std::io::Error].
    Io(io::Error),

    /// A quote was found in an unquoted field, i.e. somewhere else than as the
    /// very first byte of a field.
    BareQuote {
        /// Position of the offending quote
        pos: Position,
    },

    /// The stream ended while a quoted field was still open.
    UnterminatedQuote {
        /// Position where the stream ended
        pos: Position,
    },

    /// Indicate that a non-flexible reader read a record having a different
    /// number of fields than expected.
    ///
    /// This error is not fatal: the offending record is kept within the error
    /// and the reader can still be used to read the subsequent records.
    UnequalLengths {
        /// Expected number of fields
        expected_len: usize,
        /// Actual and incorrect number of fields observed
        len: usize,
        /// Position where the offending record starts
        pos: Position,
        /// The offending record
        record: ByteRecord,
    },
}

/// An error occurring when reading/writing CSV data.
#[derive(Debug)]
pub struct Error(ErrorKind);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self(kind)
    }

    /// Return whether the wrapped error is a [`std::io::Error`].
    pub fn is_io_error(&self) -> bool {
        matches!(self.0, ErrorKind::Io(_))
    }

    /// Return whether the reader that produced this error can still be used
    /// to read further records.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.0, ErrorKind::UnequalLengths { .. })
    }

    /// Return the position attached to the error, if any.
    pub fn position(&self) -> Option<Position> {
        match self.0 {
            ErrorKind::Io(_) => None,
            ErrorKind::BareQuote { pos }
            | ErrorKind::UnterminatedQuote { pos }
            | ErrorKind::UnequalLengths { pos, .. } => Some(pos),
        }
    }

    /// Return a reference to the underlying [`ErrorKind`].
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwraps the error into its underlying [`ErrorKind`].
    pub fn into_kind(self) -> ErrorKind {
        self.0
    }

    /// Unwraps the record carried by an [`ErrorKind::UnequalLengths`] error.
    pub fn into_byte_record(self) -> Option<ByteRecord> {
        match self.0 {
            ErrorKind::UnequalLengths { record, .. } => Some(record),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err.0 {
            ErrorKind::Io(err) => err,
            _ => Self::new(io::ErrorKind::InvalidData, err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.0 {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::BareQuote { pos } => write!(
                f,
                "CSV parse error on {}: bare quote in non-quoted field",
                pos
            ),
            ErrorKind::UnterminatedQuote { pos } => write!(
                f,
                "CSV parse error on {}: unterminated quoted field",
                pos
            ),
            ErrorKind::UnequalLengths {
                expected_len,
                len,
                pos,
                ..
            } => write!(
                f,
                "CSV error on line {}: found record with {} fields, but the previous record has {} fields",
                pos.line, len, expected_len
            ),
        }
    }
}

/// A type alias for `Result<T, strict_csv::Error>`.
pub type Result<T> = result::Result<T, Error>;
