//! Fuzz target for line editing and redraw.
//!
//! Each input byte picks an editing operation; the cursor must stay in
//! bounds and render/clean must never panic at any screen width.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rawline::text::LineState;

fuzz_target!(|data: &[u8]| {
    let Some((&width, ops)) = data.split_first() else {
        return;
    };
    let mut state = LineState::new("> ", None, true, usize::from(width % 64));
    for &op in ops {
        match op % 16 {
            0 => state.insert(&['a']),
            1 => state.insert(&['漢']),
            2 => state.insert(&[' ']),
            3 => state.backspace(),
            4 => {
                state.delete();
            }
            5 => state.move_backward(),
            6 => state.move_forward(),
            7 => {
                state.move_prev_word();
            }
            8 => {
                state.move_next_word();
            }
            9 => state.kill(),
            10 => {
                state.yank();
            }
            11 => state.transpose(),
            12 => state.delete_word(),
            13 => state.back_escape_word(),
            14 => state.move_line_start(),
            _ => state.insert(&['\t']),
        }
        assert!(state.cursor() <= state.len());
        let _ = state.take_clean();
        let _ = state.take_render();
        let _ = state.idx_line();
    }
});
