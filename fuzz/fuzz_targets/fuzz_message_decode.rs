#![no_main]

use libfuzzer_sys::fuzz_target;

use kestrel_messages::codec::decode;
use kestrel_messages::{BlockAccepted, Request, Response};

fuzz_target!(|data: &[u8]| {
    // Wire blobs come straight off the bus; decoding must never panic.
    let _ = decode::<Request>(data);
    let _ = decode::<Response>(data);
    let _ = decode::<BlockAccepted>(data);
});
