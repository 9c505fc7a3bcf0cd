#![no_main]

use libfuzzer_sys::fuzz_target;

use strict_csv::{ByteRecord, Error, Position, ReaderBuilder};

// Records read one by one, and the fault that ended the stream if any
fn read_one_by_one(data: &[u8], capacity: usize, reuse: bool) -> (Vec<ByteRecord>, Option<Position>) {
    let mut reader = ReaderBuilder::with_capacity(capacity)
        .flexible(true)
        .reuse_record(reuse)
        .from_reader(data);

    let mut records = Vec::new();

    loop {
        match reader.read_record() {
            Ok(Some(record)) => records.push(record.into_owned()),
            Ok(None) => return (records, None),
            Err(err) => {
                assert!(!err.is_recoverable());
                assert!(reader.read_record().unwrap().is_none());

                return (records, err.position());
            }
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let (copied, copy_fault) = read_one_by_one(data, 1 << 10, false);
    let (reused, reuse_fault) = read_one_by_one(data, 1 << 10, true);
    let (tiny, tiny_fault) = read_one_by_one(data, 3, false);

    assert_eq!(copied, reused);
    assert_eq!(copied, tiny);
    assert_eq!(copy_fault, reuse_fault);
    assert_eq!(copy_fault, tiny_fault);

    let all: Result<Vec<ByteRecord>, Error> = ReaderBuilder::new()
        .flexible(true)
        .from_reader(data)
        .read_all();

    match all {
        Ok(records) => {
            assert!(copy_fault.is_none());
            assert_eq!(records, copied);
        }
        Err(err) => assert_eq!(err.position(), copy_fault),
    }
});
