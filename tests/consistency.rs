use std::io::Cursor;

use bstr::ByteSlice;
use strict_csv::{ByteRecord, ErrorKind, Position, ReaderBuilder, WriterBuilder};

const CAPACITIES: [usize; 6] = [1, 2, 3, 4, 32, 1024];

const WELL_FORMED: &[&str] = &[
    "",
    "a",
    "one,two\nthree,four\n",
    "alpha,beta,gamma",
    "a,\"b,b\",c\n",
    "a,\"b\"\"c\",d\n",
    "name,surname\r\njohn,\"landis\r\nthe second\"\r\n\"lucy\",rose",
    "\"\",\"\"\"\"\n,\n",
    "x,\"multi\nline\nfield\",z\nu,v,w\n",
    "h1,h2\n\"quoted\",plain\nplain,\"quoted\"",
    "é,ü\n\"ß,ø\",ñ\n",
];

const FAULTY: &[&str] = &[
    "a\"b,c\n",
    "\"alpha\nbeta",
    "\"value",
    "ok,ok\nab,c\"d\n",
    "good\n\"bad\"x\"\n",
];

const MISMATCHED: &[&str] = &[
    "a,b\nc\nd,e\n",
    "x\n\"y\nz\",w\nv\n",
    "one,two\n\n",
    "h1,h2\nok,ok\nbad\"quote,x\nshort\n",
    "h1,h2\nshort\nbad\"quote,x\n",
];

fn fault_tag(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Io(_) => "io",
        ErrorKind::BareQuote { .. } => "bare-quote",
        ErrorKind::UnterminatedQuote { .. } => "unterminated-quote",
        ErrorKind::UnequalLengths { .. } => "unequal-lengths",
        _ => "other",
    }
}

type Fault = Option<(&'static str, Option<Position>)>;

// Reads records until the end of the stream or the first error
fn read_one_by_one(data: &str, capacity: usize, reuse: bool, flexible: bool) -> (Vec<ByteRecord>, Fault) {
    let mut reader = ReaderBuilder::with_capacity(capacity)
        .reuse_record(reuse)
        .flexible(flexible)
        .from_reader(Cursor::new(data));

    let mut records = Vec::new();

    loop {
        match reader.read_record() {
            Ok(Some(record)) => records.push(record.into_owned()),
            Ok(None) => return (records, None),
            Err(err) => return (records, Some((fault_tag(err.kind()), err.position()))),
        }
    }
}

#[test]
fn copy_and_reuse_modes_agree() {
    for data in WELL_FORMED.iter().chain(FAULTY).chain(MISMATCHED) {
        for flexible in [false, true] {
            let (expected, expected_fault) = read_one_by_one(data, 1024, false, flexible);

            for capacity in CAPACITIES {
                for reuse in [false, true] {
                    let (records, fault) = read_one_by_one(data, capacity, reuse, flexible);

                    assert_eq!(records, expected, "data={:?} capacity={}", data, capacity);
                    assert_eq!(fault, expected_fault, "data={:?} capacity={}", data, capacity);
                }
            }
        }
    }
}

#[test]
fn read_all_agrees_with_single_reads() {
    for data in WELL_FORMED.iter().chain(FAULTY).chain(MISMATCHED) {
        for flexible in [false, true] {
            for capacity in CAPACITIES {
                let (expected, expected_fault) = read_one_by_one(data, capacity, false, flexible);

                let result = ReaderBuilder::with_capacity(capacity)
                    .flexible(flexible)
                    .from_reader(Cursor::new(data))
                    .read_all();

                let context = format!("data={:?} capacity={} flexible={}", data, capacity, flexible);

                match result {
                    Ok(records) => {
                        assert_eq!(expected_fault, None, "{}", context);
                        assert_eq!(records, expected, "{}", context);
                    }
                    Err(err) => {
                        assert_eq!(
                            Some((fault_tag(err.kind()), err.position())),
                            expected_fault,
                            "{}",
                            context
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn read_all_stops_at_first_unequal_lengths() {
    let tests: &[(&str, &str, Position)] = &[
        ("a,b\nc\nd,e\n", "unequal-lengths", Position { line: 2, column: 1 }),
        ("x\n\"y\nz\",w\nv\n", "unequal-lengths", Position { line: 2, column: 1 }),
        ("one,two\n\n", "unequal-lengths", Position { line: 2, column: 1 }),
        ("h1,h2\nok,ok\nbad\"quote,x\nshort\n", "bare-quote", Position { line: 3, column: 4 }),
        ("h1,h2\nshort\nbad\"quote,x\n", "unequal-lengths", Position { line: 2, column: 1 }),
    ];

    for (data, tag, pos) in tests {
        for capacity in CAPACITIES {
            let err = ReaderBuilder::with_capacity(capacity)
                .from_reader(data.as_bytes())
                .read_all()
                .unwrap_err();

            assert_eq!(fault_tag(err.kind()), *tag, "data={:?} capacity={}", data, capacity);
            assert_eq!(err.position(), Some(*pos), "data={:?} capacity={}", data, capacity);
        }
    }
}

#[test]
fn faulty_inputs_are_reported() {
    for data in FAULTY {
        let (_, fault) = read_one_by_one(data, 1024, false, true);
        assert!(fault.is_some(), "data={:?}", data);
    }

    let (records, fault) = read_one_by_one("good\n\"bad\"x\"\n", 1024, false, true);

    assert_eq!(records.len(), 1);
    assert_eq!(fault, Some(("bare-quote", Some(Position { line: 2, column: 7 }))));
}

#[test]
fn writing_then_reading_round_trips() -> strict_csv::Result<()> {
    let records: Vec<Vec<&str>> = vec![
        vec!["plain", "", "with,delimiter"],
        vec!["\"quoted\"", "multi\nline", "carriage\rreturn"],
        vec!["crlf\r\nwithin", "tab\tseparated", "single'quote"],
        vec!["", "", ""],
    ];

    let configurations = [(b',', b'"', false), (b';', b'\'', true), (b'\t', b'"', false)];

    for (delimiter, quote, crlf) in configurations {
        for always_quote in [false, true] {
            let mut writer = WriterBuilder::new()
                .delimiter(delimiter)
                .quote(quote)
                .crlf(crlf)
                .always_quote(always_quote)
                .from_writer(Vec::new());

            writer.write_all(&records)?;
            writer.flush()?;

            let written = writer.get_ref().clone();

            for capacity in CAPACITIES {
                let mut reader = ReaderBuilder::with_capacity(capacity)
                    .delimiter(delimiter)
                    .quote(quote)
                    .from_reader(written.as_slice());

                let read = reader.read_all()?;

                assert_eq!(read.len(), records.len());

                for (read_record, record) in read.iter().zip(records.iter()) {
                    assert_eq!(
                        read_record.iter().collect::<Vec<_>>(),
                        record.iter().map(|cell| cell.as_bytes()).collect::<Vec<_>>(),
                        "output={:?}",
                        written.as_bstr()
                    );
                }
            }
        }
    }

    Ok(())
}

#[test]
fn reader_builder_makes_matching_writers() -> strict_csv::Result<()> {
    let data = "a;'b;c'\n'd''e';f\n";

    let mut reader_builder = ReaderBuilder::new();
    reader_builder.delimiter(b';').quote(b'\'');

    let records = reader_builder.from_reader(data.as_bytes()).read_all()?;

    let mut writer = reader_builder.to_writer_builder().from_writer(Vec::new());
    writer.write_all(&records)?;
    writer.flush()?;

    assert_eq!(writer.get_ref().as_bstr(), data.as_bytes().as_bstr());

    Ok(())
}

#[test]
fn well_formed_inputs_agree_with_csv_crate() -> anyhow::Result<()> {
    for data in WELL_FORMED {
        let mut expected = Vec::new();

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_bytes());

        for result in csv_reader.byte_records() {
            let record = result?;
            expected.push(record.iter().map(|cell| cell.to_vec()).collect::<Vec<_>>());
        }

        for capacity in CAPACITIES {
            let records = ReaderBuilder::with_capacity(capacity)
                .flexible(true)
                .from_reader(data.as_bytes())
                .read_all()?;

            let records = records
                .iter()
                .map(|record| record.iter().map(|cell| cell.to_vec()).collect::<Vec<_>>())
                .collect::<Vec<_>>();

            assert_eq!(records, expected, "data={:?} capacity={}", data, capacity);
        }
    }

    Ok(())
}

#[test]
fn unequal_lengths_are_recoverable_at_any_capacity() {
    let data = "a,b\nc\n\"d\ne\",f,g\nh,i\n";

    for capacity in CAPACITIES {
        let mut reader = ReaderBuilder::with_capacity(capacity).from_reader(data.as_bytes());

        let mut records = Vec::new();
        let mut mismatches = Vec::new();

        loop {
            match reader.read_record() {
                Ok(Some(record)) => records.push(record.into_owned()),
                Ok(None) => break,
                Err(err) => match err.into_kind() {
                    ErrorKind::UnequalLengths { pos, record, .. } => {
                        mismatches.push((pos.line, record.len()))
                    }
                    kind => panic!("unexpected error kind {:?}", kind),
                },
            }
        }

        assert_eq!(records.len(), 2);
        assert_eq!(mismatches, vec![(2, 1), (3, 3)]);
    }
}
