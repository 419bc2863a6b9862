//! Fuzz target for the escape sequence decoder.
//!
//! Terminal input is untrusted: arbitrary bytes must never panic the
//! decoder, and the accumulator must stay within its capacity.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rawline::input::{
    ESCAPE_BUFFER_CAPACITY, EscapeAccumulator, EscapeStep, command_for_escape, decode_escape,
};

fuzz_target!(|data: &[u8]| {
    // One-shot decode of the whole buffer
    if let Some(event) = decode_escape(data) {
        assert!(event.remainder.len() < data.len().max(1));
        let _ = command_for_escape(&event);
    }

    // Byte-by-byte, as the read loop feeds it
    let mut acc = EscapeAccumulator::new();
    for &byte in data {
        if !acc.is_active() {
            if byte == 0x1b {
                acc.start();
            }
            continue;
        }
        match acc.push(&[byte]) {
            EscapeStep::Matched(event) => {
                let _ = command_for_escape(&event);
            }
            EscapeStep::NeedMore => {}
            EscapeStep::Overflow(literal) => {
                assert_eq!(literal.len(), ESCAPE_BUFFER_CAPACITY + 1);
                assert_eq!(literal[0], 0x1b);
            }
        }
    }
});
