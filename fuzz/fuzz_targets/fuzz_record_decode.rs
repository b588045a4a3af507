#![no_main]

use libfuzzer_sys::fuzz_target;

use kestrel_chain::{decode_record, BlockRecord, TransactionRecord};
use kestrel_types::BlockTopology;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes as any stored record must never panic.
    let _ = decode_record::<BlockRecord>(data);
    let _ = decode_record::<TransactionRecord>(data);
    let _ = decode_record::<BlockTopology>(data);
});
