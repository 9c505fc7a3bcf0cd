use memchr::{memchr, memchr2, memchr3};

use crate::error::Position;
use crate::records::ByteRecordBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadResult {
    /// The whole input was consumed without completing a record.
    InputEmpty,
    /// A record was completed.
    Record,
    /// The input is exhausted and nothing was pending.
    End,
    /// A quote was found where it is not allowed. Nothing past the offending
    /// quote was consumed.
    BareQuote,
    /// The input ended within a quoted field.
    UnterminatedQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Unquoted,
    Quoted,
    // Just read a quote within a quoted field: it is either the first half
    // of an escaped quote or the end of the quoted region.
    Quote,
}

/// Byte-level CSV state machine.
///
/// It is fed arbitrary windows of the stream and never needs to look past the
/// end of the window it is given, so that records can span any number of
/// buffer refills.
pub(crate) struct CoreReader {
    pub(crate) delimiter: u8,
    pub(crate) quote: u8,
    state: ReadState,
    field_was_quoted: bool,
    // A CR just ended a record: a directly following LF belongs to it.
    skip_lf: bool,
    line: u64,
    column: u64,
}

impl CoreReader {
    pub(crate) fn new(delimiter: u8, quote: u8) -> Self {
        Self {
            delimiter,
            quote,
            state: ReadState::Unquoted,
            field_was_quoted: false,
            skip_lf: false,
            line: 1,
            column: 1,
        }
    }

    #[inline(always)]
    pub(crate) fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Find the next byte having a meaning in unquoted state.
    #[inline]
    fn find_structural(&self, haystack: &[u8]) -> Option<usize> {
        let found = memchr3(self.delimiter, self.quote, b'\n', haystack);
        let end = found.unwrap_or(haystack.len());

        memchr(b'\r', &haystack[..end]).or(found)
    }

    #[inline]
    fn end_field(&mut self, record_builder: &mut ByteRecordBuilder) {
        record_builder.finalize_field();
        self.field_was_quoted = false;
    }

    #[inline]
    fn end_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    pub(crate) fn read_record(
        &mut self,
        input: &[u8],
        record_builder: &mut ByteRecordBuilder,
    ) -> (ReadResult, usize) {
        use ReadState::*;

        let input_len = input.len();
        let mut pos: usize = 0;

        if input_len == 0 {
            return (ReadResult::InputEmpty, 0);
        }

        if self.skip_lf {
            self.skip_lf = false;

            if input[0] == b'\n' {
                pos += 1;
            }
        }

        while pos < input_len {
            match self.state {
                Unquoted => {
                    let haystack = &input[pos..];

                    let offset = match self.find_structural(haystack) {
                        None => {
                            record_builder.extend_from_slice(haystack);
                            self.column += haystack.len() as u64;
                            break;
                        }
                        Some(offset) => offset,
                    };

                    // Copying the plain run preceding the structural byte at once
                    record_builder.extend_from_slice(&haystack[..offset]);
                    self.column += offset as u64;
                    pos += offset;

                    let byte = input[pos];

                    if byte == self.delimiter {
                        self.end_field(record_builder);
                        self.column += 1;
                        pos += 1;
                    } else if byte == b'\n' {
                        self.end_field(record_builder);
                        self.end_line();
                        return (ReadResult::Record, pos + 1);
                    } else if byte == b'\r' {
                        self.end_field(record_builder);
                        self.end_line();
                        self.skip_lf = true;
                        return (ReadResult::Record, pos + 1);
                    } else {
                        // Here, `byte` is guaranteed to be a quote
                        if !record_builder.field_is_empty() || self.field_was_quoted {
                            return (ReadResult::BareQuote, pos);
                        }

                        self.state = Quoted;
                        self.field_was_quoted = true;
                        self.column += 1;
                        pos += 1;
                    }
                }
                Quoted => {
                    let haystack = &input[pos..];

                    match memchr2(self.quote, b'\n', haystack) {
                        None => {
                            record_builder.extend_from_slice(haystack);
                            self.column += haystack.len() as u64;
                            pos = input_len;
                        }
                        Some(offset) => {
                            record_builder.extend_from_slice(&haystack[..offset]);
                            pos += offset;

                            if input[pos] == b'\n' {
                                record_builder.push_byte(b'\n');
                                self.end_line();
                            } else {
                                self.state = Quote;
                                self.column += offset as u64 + 1;
                            }

                            pos += 1;
                        }
                    }
                }
                Quote => {
                    if input[pos] == self.quote {
                        record_builder.push_byte(self.quote);
                        self.state = Quoted;
                        self.column += 1;
                        pos += 1;
                    } else {
                        // NOTE: the byte is not consumed and will be handled
                        // by the unquoted state.
                        self.state = Unquoted;
                    }
                }
            }
        }

        (ReadResult::InputEmpty, input_len)
    }

    /// Notify the state machine that the stream is exhausted.
    pub(crate) fn finish(&mut self, record_builder: &mut ByteRecordBuilder) -> ReadResult {
        self.skip_lf = false;

        match self.state {
            ReadState::Quoted => ReadResult::UnterminatedQuote,
            _ => {
                self.state = ReadState::Unquoted;

                // NOTE: this is required to handle streams not ending with a newline
                if !record_builder.is_pristine() || self.field_was_quoted {
                    self.end_field(record_builder);
                    ReadResult::Record
                } else {
                    ReadResult::End
                }
            }
        }
    }
}
