/*!
The `strict-csv` crate provides a streaming CSV reader & writer that never
guesses: malformed quoting is reported with its exact line & column instead of
being silently repaired.

The reader parses through a fixed-size buffer, so memory usage only depends on
the size of the largest record, and scans unquoted & quoted data using the
SIMD-accelerated routines of the [`memchr`](https://docs.rs/memchr/latest/memchr/)
crate.

# Examples

*Reading a CSV file*

```
use std::fs::File;
use strict_csv::Reader;

let mut reader = Reader::from_reader(File::open("data.csv")?);

while let Some(record) = reader.read_record()? {
    for cell in record.iter() {
        dbg!(cell);
    }
}
```

*Using a builder to configure your reader, and lending records*

```
use std::fs::File;
use strict_csv::ReaderBuilder;

let mut reader = ReaderBuilder::new()
    .delimiter(b'\t')
    .reuse_record(true)
    .buffer_capacity(16 * (1 << 10))
    .from_reader(File::open("data.tsv")?);

while let Some(record) = reader.read_record()? {
    // `record` is borrowed from the reader until the next call
    let kept = record.into_owned();
}
```

*Recovering from records having an unexpected number of fields*

```
use strict_csv::{ErrorKind, Reader};

let mut reader = Reader::from_reader("a,b\nc\nd,e\n".as_bytes());

loop {
    match reader.read_record() {
        Ok(Some(record)) => println!("{:?}", record),
        Ok(None) => break,
        Err(err) if err.is_recoverable() => {
            eprintln!("{}", err);
            dbg!(err.into_byte_record());
        }
        Err(err) => return Err(err.into()),
    }
}
```

*Writing CSV data*

```
use std::io;
use strict_csv::WriterBuilder;

let mut writer = WriterBuilder::new().crlf(true).from_writer(io::stdout());

writer.write_record(["name", "quote"])?;
writer.write_record(["john", "he said \"hi\""])?;
writer.flush()?;
```

# Grammar

- Records are terminated by LF, CR or CRLF. A CRLF split over two reads
  still counts as a single terminator.
- Fields are separated by a single-byte delimiter (a comma by default).
- A field may be enclosed by a single-byte quote char (a double quote by
  default). Within quotes, the delimiter and line terminators are regular
  data and a quote is escaped by doubling it.
- A quote is only allowed as the very first byte of a field. Anywhere else it
  is a [`ErrorKind::BareQuote`] error, and the stream ending within quotes is a
  [`ErrorKind::UnterminatedQuote`] error. Both are fatal.
- An empty line is a record containing a single empty field.
- Unless the reader is flexible, every record must have as many fields as the
  first one (or as configured). Mismatching records are reported as
  [`ErrorKind::UnequalLengths`] errors carrying the record, and reading can go
  on afterwards.

# Positions

Lines are 1-based and incremented on every line terminator, including the ones
found within quoted fields. Columns are 1-based, counted in bytes and reset on
every new line.

# Logging

The crate emits diagnostics using the [`tracing`](https://docs.rs/tracing/)
facade, at `debug` level when an error is recorded and at `trace` level when
reaching the end of a stream. It never installs a subscriber by itself.
*/
#[allow(unused_macros)]
macro_rules! brec {
    () => {{
        $crate::records::ByteRecord::new()
    }};

    ($($x: expr),*) => {{
        let mut r = $crate::records::ByteRecord::new();

        $(
            r.push_field($x.as_bytes());
        )*

        r
    }};
}

mod buffer;
mod core;
mod debug;
mod error;
mod reader;
mod records;
mod writer;

pub use error::{Error, ErrorKind, Position, Result};
pub use reader::{ByteRecordsIntoIter, ByteRecordsIter, Reader, ReaderBuilder};
pub use records::{ByteRecord, ByteRecordIter};
pub use writer::{StickyError, Writer, WriterBuilder};
