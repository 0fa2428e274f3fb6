//! AFL fuzz target for the Protocol Codec's frame decoder.
//!
//! Feeds arbitrary bytes, reinterpreted as (possibly invalid) UTF-8 text, to
//! [`ocpp_central::codec::decode`] in a loop compatible with AFL's persistent
//! mode. `decode` must never panic on malformed input — it returns a
//! `CodecError` instead — so any crash here is a real bug.
unsafe extern "C" {
    fn __AFL_LOOP(cnt: u32) -> i32;
}
use std::io::{self, Read};

use ocpp_central::codec;

const MAX_INPUT_LEN: u64 = 64 * 1024;

fn main() {
    let mut data = Vec::with_capacity(MAX_INPUT_LEN as usize);
    loop {
        if unsafe { __AFL_LOOP(1000) } == 0 {
            break;
        }
        data.clear();
        if io::stdin().take(MAX_INPUT_LEN).read_to_end(&mut data).is_err() {
            return;
        }

        let text = String::from_utf8_lossy(&data);
        let _ = codec::decode(&text);
    }
}
