//! Property-based tests for line editing, width and rendering invariants.

use proptest::prelude::*;
use rawline::text::LineState;
use rawline::unicode::{split_by_line, width, width_all};

// ============================================================================
// Strategies
// ============================================================================

/// Runes mixing ASCII, wide CJK, combining marks and tabs.
fn runes() -> impl Strategy<Value = Vec<char>> {
    prop::collection::vec(
        prop_oneof![
            4 => prop::char::range('a', 'z'),
            1 => Just(' '),
            1 => prop::sample::select(vec!['中', '文', '한', '語']),
            1 => prop::sample::select(vec!['\u{301}', '\t', 'é']),
        ],
        0..40,
    )
}

#[derive(Clone, Debug)]
enum Op {
    Write(Vec<char>),
    Backspace,
    Delete,
    Start,
    End,
    Backward,
    Forward,
    PrevWord,
    NextWord,
    EndWord,
    DeleteWord,
    BackEscapeWord,
    Kill,
    KillFront,
    Yank,
    Transpose,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => runes().prop_map(Op::Write),
        1 => Just(Op::Backspace),
        1 => Just(Op::Delete),
        1 => Just(Op::Start),
        1 => Just(Op::End),
        1 => Just(Op::Backward),
        1 => Just(Op::Forward),
        1 => Just(Op::PrevWord),
        1 => Just(Op::NextWord),
        1 => Just(Op::EndWord),
        1 => Just(Op::DeleteWord),
        1 => Just(Op::BackEscapeWord),
        1 => Just(Op::Kill),
        1 => Just(Op::KillFront),
        1 => Just(Op::Yank),
        1 => Just(Op::Transpose),
    ]
}

fn apply(state: &mut LineState, op: &Op) {
    match op {
        Op::Write(s) => state.insert(s),
        Op::Backspace => state.backspace(),
        Op::Delete => {
            state.delete();
        }
        Op::Start => state.move_line_start(),
        Op::End => state.move_line_end(),
        Op::Backward => state.move_backward(),
        Op::Forward => state.move_forward(),
        Op::PrevWord => {
            state.move_prev_word();
        }
        Op::NextWord => {
            state.move_next_word();
        }
        Op::EndWord => {
            state.move_end_word();
        }
        Op::DeleteWord => state.delete_word(),
        Op::BackEscapeWord => state.back_escape_word(),
        Op::Kill => state.kill(),
        Op::KillFront => state.kill_front(),
        Op::Yank => {
            state.yank();
        }
        Op::Transpose => state.transpose(),
    }
}

fn state_with(text: &[char], screen_width: usize) -> LineState {
    let mut state = LineState::new("> ", None, true, screen_width);
    state.set(text);
    state
}

// ============================================================================
// Editing properties
// ============================================================================

proptest! {
    /// The cursor never leaves `0..=len`.
    #[test]
    fn cursor_stays_in_bounds(ops in prop::collection::vec(op(), 0..60)) {
        let mut state = LineState::new("", None, false, 80);
        for op in &ops {
            apply(&mut state, op);
            prop_assert!(state.cursor() <= state.len(), "{op:?} left cursor past end");
        }
    }

    /// Two yanks after a kill insert the killed span twice.
    #[test]
    fn kill_then_double_yank(text in runes(), at in 0usize..40) {
        let mut state = state_with(&text, 80);
        state.set_with_cursor(at, &text);
        state.kill();
        let killed = state.kill_register().len();
        let before = state.len();
        state.yank();
        state.yank();
        prop_assert_eq!(state.len(), before + 2 * killed);
    }

    /// Restore brings back exactly the backed-up text and cursor.
    #[test]
    fn backup_restore_roundtrip(
        text in runes(),
        at in 0usize..40,
        ops in prop::collection::vec(op(), 0..20),
    ) {
        let mut state = state_with(&text, 80);
        state.set_with_cursor(at, &text);
        let (saved_text, saved_cursor) = (state.runes().to_vec(), state.cursor());
        state.backup();
        for op in &ops {
            apply(&mut state, op);
        }
        prop_assert!(state.restore());
        prop_assert_eq!(state.runes(), saved_text.as_slice());
        prop_assert_eq!(state.cursor(), saved_cursor);
    }

    /// Yanking with an empty register changes nothing.
    #[test]
    fn yank_with_empty_register_is_noop(text in runes()) {
        let mut state = state_with(&text, 80);
        prop_assert!(!state.yank());
        prop_assert_eq!(state.runes(), text.as_slice());
    }
}

// ============================================================================
// Width and wrapping properties
// ============================================================================

proptest! {
    /// Splitting into rows loses and duplicates nothing.
    #[test]
    fn split_by_line_is_lossless(s in runes(), start in 0usize..10, w in 1usize..30) {
        let joined: String = split_by_line(start, w, &s).concat();
        prop_assert_eq!(joined, s.iter().collect::<String>());
    }

    /// Width of a slice is the sum of rune widths.
    #[test]
    fn width_is_additive(s in runes()) {
        prop_assert_eq!(width_all(&s), s.iter().map(|&c| width(c)).sum::<usize>());
    }

    /// Every row but the last fills the screen.
    #[test]
    fn split_rows_fill_screen(s in runes(), w in 4usize..30) {
        let rows = split_by_line(0, w, &s);
        for row in &rows[..rows.len() - 1] {
            let chars: Vec<char> = row.chars().collect();
            prop_assert!(width_all(&chars) >= w);
        }
    }
}

// ============================================================================
// Rendering properties
// ============================================================================

proptest! {
    /// Clean is a pure erase: render, clean, render gives the same frame.
    #[test]
    fn render_clean_render_is_stable(text in runes(), at in 0usize..40, w in 0usize..30) {
        let mut state = state_with(&text, w);
        state.set_with_cursor(at, &text);
        let first = state.take_render();
        prop_assert!(state.take_clean().is_some());
        prop_assert!(state.take_clean().is_none());
        let second = state.take_render();
        prop_assert_eq!(first, second);
    }

    /// Styling repaints without touching the text.
    #[test]
    fn style_leaves_text_unchanged(text in runes(), a in 0usize..40, b in 0usize..40) {
        let state = state_with(&text, 20);
        let (start, end) = (a.min(b).min(text.len()), a.max(b).min(text.len()));
        let bytes = state.style_bytes(start, end, "1;31");
        prop_assert!(!bytes.is_empty());
        prop_assert_eq!(state.runes(), text.as_slice());
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_backspace_at_end() {
    let mut state = state_with(&['a', 'b', 'c'], 80);
    state.backspace();
    assert_eq!(state.runes(), &['a', 'b']);
    assert_eq!(state.cursor(), 2);
}

#[test]
fn test_next_word_from_start() {
    let text: Vec<char> = "hello world".chars().collect();
    let mut state = state_with(&text, 80);
    state.set_with_cursor(0, &text);
    state.move_next_word();
    assert_eq!(state.cursor(), 6);
}

#[test]
fn test_style_wraps_exact_span() {
    let text: Vec<char> = "abcdef".chars().collect();
    let state = state_with(&text, 80);
    let bytes = String::from_utf8(state.style_bytes(1, 3, "1;31")).unwrap();
    assert!(bytes.contains("\x1b[1;31mbc\x1b[0m"), "{bytes:?}");
    assert_eq!(state.runes(), text.as_slice());
}
