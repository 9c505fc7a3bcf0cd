#![no_main]

use libfuzzer_sys::fuzz_target;

use strict_csv::{ByteRecord, Reader, Writer};

fuzz_target!(|data: &[u8]| {
    // Every byte chunk separated by NUL becomes a field
    let record: ByteRecord = data.split(|byte| *byte == 0).collect();

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_byte_record(&record).unwrap();
    writer.write_byte_record(&record).unwrap();

    let output = writer.into_inner().unwrap();

    let mut reader = Reader::from_reader(output.as_slice());
    let records = reader.read_all().unwrap();

    assert_eq!(records, vec![record.clone(), record]);
});
