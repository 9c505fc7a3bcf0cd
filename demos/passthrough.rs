use std::fs::File;
use std::io::{self, Read};

use anyhow::{bail, Context};
use bstr::ByteSlice;
use clap::Parser;
use strict_csv::{ReaderBuilder, WriterBuilder};

fn parse_byte(value: &str) -> Result<u8, String> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(format!("expected a single byte, got {:?}", value)),
        },
    }
}

/// Read CSV data and write it back to stdout, possibly translating its
/// delimiter & quote char.
#[derive(Parser, Debug)]
struct Args {
    /// Path to target CSV file. Reads stdin if not given
    path: Option<String>,

    /// Input delimiter
    #[arg(short, long, default_value = ",", value_parser = parse_byte)]
    delimiter: u8,

    /// Input quote char
    #[arg(short, long, default_value = "\"", value_parser = parse_byte)]
    quote: u8,

    /// Output delimiter. Defaults to the input one
    #[arg(long, value_parser = parse_byte)]
    out_delimiter: Option<u8>,

    /// Output quote char. Defaults to the input one
    #[arg(long, value_parser = parse_byte)]
    out_quote: Option<u8>,

    /// Terminate output records with CRLF
    #[arg(long)]
    crlf: bool,

    /// Quote every output field
    #[arg(long)]
    always_quote: bool,

    /// Accept records having a varying number of fields
    #[arg(long)]
    flexible: bool,

    /// Input buffer capacity
    #[arg(long, default_value_t = 64 * (1 << 10))]
    buffer_capacity: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let input: Box<dyn Read> = match &args.path {
        Some(path) => Box::new(File::open(path).with_context(|| format!("cannot open {}", path))?),
        None => Box::new(io::stdin().lock()),
    };

    let mut reader_builder = ReaderBuilder::with_capacity(args.buffer_capacity);

    reader_builder
        .delimiter(args.delimiter)
        .quote(args.quote)
        .reuse_record(true)
        .flexible(args.flexible);

    let mut writer_builder = reader_builder.to_writer_builder();

    writer_builder
        .delimiter(args.out_delimiter.unwrap_or(args.delimiter))
        .quote(args.out_quote.unwrap_or(args.quote))
        .crlf(args.crlf)
        .always_quote(args.always_quote);

    let mut reader = reader_builder.from_reader(input);
    let mut writer = writer_builder.from_writer(io::stdout().lock());

    let mut skipped: usize = 0;

    loop {
        match reader.read_record() {
            Ok(Some(record)) => writer.write_byte_record(&record)?,
            Ok(None) => break,
            Err(err) if err.is_recoverable() => {
                skipped += 1;

                let pos = err.position();

                if let Some(record) = err.into_byte_record() {
                    let cells = record
                        .iter()
                        .map(|cell| cell.to_str_lossy().into_owned())
                        .collect::<Vec<_>>();

                    tracing::warn!(?pos, ?cells, "skipping record with unexpected number of fields");
                }
            }
            Err(err) => {
                writer.flush()?;
                bail!("{}", err);
            }
        }
    }

    writer.flush()?;

    if skipped > 0 {
        tracing::info!("skipped {} records", skipped);
    }

    Ok(())
}
