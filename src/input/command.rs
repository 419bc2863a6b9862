//! Dispatch tables from key input to editing commands.

use super::escape::EscapeKeyEvent;
use super::keys;

/// One editing action the read loop applies to the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditCommand {
    LineStart,
    LineEnd,
    Backward,
    Forward,
    PrevWord,
    NextWord,
    /// Delete the rune under the cursor.
    Delete,
    /// Delete the rune under the cursor, or end input on an empty line.
    DeleteOrEof,
    DeleteWord,
    BackEscapeWord,
    Backspace,
    Kill,
    KillFront,
    Yank,
    Transpose,
    Interrupt,
    Bell,
    Complete,
    Enter,
    ClearScreen,
    HistoryPrev,
    HistoryNext,
    SearchBackward,
    SearchForward,
    /// Cursor position report used as a screen size answer.
    ScreenSize { rows: u32, cols: u32 },
    /// Recognized and consumed, with no effect.
    Noop,
}

/// Command bound to a single input byte, `None` for text.
#[must_use]
pub fn command_for_byte(b: u8) -> Option<EditCommand> {
    let cmd = match b {
        keys::LINE_START => EditCommand::LineStart,
        keys::BACKWARD => EditCommand::Backward,
        keys::INTERRUPT => EditCommand::Interrupt,
        keys::DELETE => EditCommand::DeleteOrEof,
        keys::LINE_END => EditCommand::LineEnd,
        keys::FORWARD => EditCommand::Forward,
        keys::BELL => EditCommand::Bell,
        keys::CTRL_H | keys::DEL => EditCommand::Backspace,
        keys::TAB => EditCommand::Complete,
        keys::CTRL_J | keys::ENTER => EditCommand::Enter,
        keys::KILL => EditCommand::Kill,
        keys::CLEAR => EditCommand::ClearScreen,
        keys::NEXT => EditCommand::HistoryNext,
        keys::PREV => EditCommand::HistoryPrev,
        keys::BCK_SEARCH => EditCommand::SearchBackward,
        keys::FWD_SEARCH => EditCommand::SearchForward,
        keys::TRANSPOSE => EditCommand::Transpose,
        keys::KILL_FRONT => EditCommand::KillFront,
        keys::YANK => EditCommand::Yank,
        _ => return None,
    };
    Some(cmd)
}

/// Command for a decoded escape sequence. Unknown sequences are consumed
/// as [`EditCommand::Noop`].
#[must_use]
pub fn command_for_escape(ev: &EscapeKeyEvent) -> EditCommand {
    match ev.ch {
        b'b' => EditCommand::PrevWord,
        b'f' => EditCommand::NextWord,
        b'd' => EditCommand::DeleteWord,
        keys::DEL => EditCommand::BackEscapeWord,
        keys::TRANSPOSE => EditCommand::Transpose,
        b'[' | b'O' => command_for_sequence(ev),
        _ => EditCommand::Noop,
    }
}

fn command_for_sequence(ev: &EscapeKeyEvent) -> EditCommand {
    match ev.kind {
        b'~' => command_for_tilde(ev),
        b'R' => match (ev.attribute, ev.attribute2) {
            (Some(rows), Some(cols)) => EditCommand::ScreenSize { rows, cols },
            _ => EditCommand::Noop,
        },
        kind if ev.has_no_attributes() => match kind {
            b'A' => EditCommand::HistoryPrev,
            b'B' => EditCommand::HistoryNext,
            b'C' => EditCommand::Forward,
            b'D' => EditCommand::Backward,
            b'H' => EditCommand::LineStart,
            b'F' => EditCommand::LineEnd,
            _ => EditCommand::Noop,
        },
        // Alt (3) and Ctrl (5) modified arrows.
        b'C' | b'D' if ev.attribute == Some(1) && matches!(ev.attribute2, Some(3 | 5)) => {
            if ev.kind == b'C' {
                EditCommand::NextWord
            } else {
                EditCommand::PrevWord
            }
        }
        _ => EditCommand::Noop,
    }
}

fn command_for_tilde(ev: &EscapeKeyEvent) -> EditCommand {
    if ev.attribute2.is_some() {
        return EditCommand::Noop;
    }
    match ev.attribute {
        Some(1 | 7) => EditCommand::LineStart,
        Some(3) => EditCommand::Delete,
        Some(4 | 8) => EditCommand::LineEnd,
        // Insert, PageUp, PageDown.
        _ => EditCommand::Noop,
    }
}
