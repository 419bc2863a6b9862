//! The read-dispatch loop: bytes in, line edits and finished lines out.

use super::config::{AutoCompleter, RuneFilter};
use super::history::{History, Newer};
use super::mailbox::{LineResult, Mailbox};
use crate::error::{Error, Result};
use crate::input::{
    EditCommand, EscapeAccumulator, EscapeStep, ExtendedStdin, command_for_byte,
    command_for_escape, encode_control_chars, keys,
};
use crate::text::LineBuffer;
use crate::unicode::aggregate;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// State shared between the session handle and its background threads.
pub(super) struct Shared {
    pub(super) buffer: LineBuffer,
    pub(super) mailbox: Mailbox,
    pub(super) history: Mutex<History>,
    pub(super) fatal: Mutex<Option<Error>>,
    pub(super) stop: AtomicBool,
    pub(super) rune_filter: Option<Arc<dyn RuneFilter>>,
    pub(super) auto_complete: Option<Arc<dyn AutoCompleter>>,
    pub(super) auto_save_history: bool,
}

impl Shared {
    pub(super) fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn fatal_error(&self) -> Option<Error> {
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_fatal(&self, err: Error) {
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(err);
    }

    pub(super) fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

fn line_bytes(line: &[char]) -> Vec<u8> {
    line.iter().collect::<String>().into_bytes()
}

/// Bytes in a UTF-8 sequence starting with `lead`; 0 for a byte that
/// cannot start one.
fn utf8_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 0,
    }
}

/// Decoder and dispatcher owned by the read thread.
pub(super) struct ReadLoop {
    shared: Arc<Shared>,
    stdin: Arc<ExtendedStdin>,
    esc: EscapeAccumulator,
    /// Bytes handed back by the escape decoder or a broken UTF-8 sequence.
    pending: VecDeque<u8>,
    /// Pattern of an ongoing history search.
    search: Option<Vec<char>>,
}

impl ReadLoop {
    pub(super) fn new(shared: Arc<Shared>, stdin: Arc<ExtendedStdin>) -> Self {
        Self {
            shared,
            stdin,
            esc: EscapeAccumulator::new(),
            pending: VecDeque::new(),
            search: None,
        }
    }

    /// Run until input ends, a fatal error occurs or the session stops.
    pub(super) fn run(mut self) {
        let err = loop {
            if self.shared.is_stopped() {
                break Error::Cancelled;
            }
            if let Err(err) = self.step() {
                break err;
            }
            if let Some(err) = self.shared.buffer.take_write_error() {
                break err;
            }
        };
        self.terminate(err);
    }

    fn terminate(&mut self, err: Error) {
        if err.is_end_of_input() {
            tracing::debug!(error = %err, "read loop finished");
        } else {
            tracing::warn!(error = %err, "read loop failed");
        }
        self.shared.record_fatal(err.clone());
        let buffer = &self.shared.buffer;
        let partial = if buffer.has_frame() {
            buffer.finish("\n")
        } else {
            buffer.reset()
        };
        self.shared.mailbox.try_put(LineResult {
            line: line_bytes(&partial),
            error: Some(err),
        });
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        match self.pending.pop_front() {
            Some(b) => Ok(Some(b)),
            None => self.stdin.read_byte(),
        }
    }

    fn step(&mut self) -> Result<()> {
        let b = match self.next_byte() {
            Ok(Some(b)) => b,
            Ok(None) => return Err(Error::EndOfInput),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                self.esc.reset();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        if self.esc.is_active() {
            // ESC + multibyte char: only the lead byte reaches the decoder,
            // the rest of the character goes with it
            if utf8_len(b) > 1 {
                match self.read_char(b) {
                    Ok(_) => {}
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                        self.esc.reset();
                        return Ok(());
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            return self.feed_escape(b);
        }

        let ch = match self.read_char(b) {
            Ok(ch) => ch,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                self.esc.reset();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let ch = match &self.shared.rune_filter {
            Some(filter) => match filter.filter(ch) {
                (ch, true) => ch,
                (_, false) => return Ok(()),
            },
            None => ch,
        };

        if ch == char::from(keys::ESC) {
            self.esc.start();
            return Ok(());
        }
        match u8::try_from(ch).ok().and_then(command_for_byte) {
            Some(cmd) => self.apply(cmd),
            None => {
                self.insert(ch);
                Ok(())
            }
        }
    }

    /// Decode one character starting with `lead`. Malformed input becomes
    /// U+FFFD; a byte that breaks a sequence is read again on its own.
    fn read_char(&mut self, lead: u8) -> io::Result<char> {
        let len = utf8_len(lead);
        if len == 1 {
            return Ok(char::from(lead));
        }
        if len == 0 {
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        let mut buf = [lead, 0, 0, 0];
        for slot in &mut buf[1..len] {
            match self.next_byte()? {
                Some(b) if b & 0xc0 == 0x80 => *slot = b,
                Some(b) => {
                    self.pending.push_front(b);
                    return Ok(char::REPLACEMENT_CHARACTER);
                }
                None => return Ok(char::REPLACEMENT_CHARACTER),
            }
        }
        Ok(std::str::from_utf8(&buf[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn feed_escape(&mut self, b: u8) -> Result<()> {
        match self.esc.push(&[b]) {
            EscapeStep::NeedMore => Ok(()),
            EscapeStep::Matched(event) => {
                for &rest in event.remainder.iter().rev() {
                    self.pending.push_front(rest);
                }
                self.apply(command_for_escape(&event))
            }
            EscapeStep::Overflow(literal) => {
                self.search = None;
                let text = String::from_utf8_lossy(&encode_control_chars(&literal)).into_owned();
                self.shared.buffer.write_str(&text);
                Ok(())
            }
        }
    }

    fn insert(&mut self, ch: char) {
        self.search = None;
        let buffer = &self.shared.buffer;
        if ch.is_ascii_control() {
            let mut utf8 = [0u8; 4];
            let shown = encode_control_chars(ch.encode_utf8(&mut utf8).as_bytes());
            buffer.write_str(&String::from_utf8_lossy(&shown));
        } else {
            buffer.write(&[ch]);
        }
    }

    fn apply(&mut self, cmd: EditCommand) -> Result<()> {
        if !matches!(
            cmd,
            EditCommand::SearchBackward | EditCommand::SearchForward
        ) {
            self.search = None;
        }
        let buffer = &self.shared.buffer;
        match cmd {
            EditCommand::LineStart => buffer.move_line_start(),
            EditCommand::LineEnd => buffer.move_line_end(),
            EditCommand::Backward => buffer.move_backward(),
            EditCommand::Forward => buffer.move_forward(),
            EditCommand::PrevWord => {
                buffer.move_prev_word();
            }
            EditCommand::NextWord => {
                buffer.move_next_word();
            }
            EditCommand::Delete => {
                buffer.delete();
            }
            EditCommand::DeleteOrEof => {
                if buffer.is_empty() {
                    return Err(Error::EndOfInput);
                }
                if !buffer.delete() {
                    buffer.bell();
                }
            }
            EditCommand::DeleteWord => buffer.delete_word(),
            EditCommand::BackEscapeWord => buffer.back_escape_word(),
            EditCommand::Backspace => {
                if buffer.cursor() == 0 {
                    buffer.bell();
                } else {
                    buffer.backspace();
                }
            }
            EditCommand::Kill => buffer.kill(),
            EditCommand::KillFront => buffer.kill_front(),
            EditCommand::Yank => {
                buffer.yank();
            }
            EditCommand::Transpose => buffer.transpose(),
            EditCommand::Interrupt => self.interrupt(),
            EditCommand::Bell => buffer.bell(),
            EditCommand::Complete => self.complete()?,
            EditCommand::Enter => self.submit(),
            EditCommand::ClearScreen => buffer.clear_screen(),
            EditCommand::HistoryPrev => self.history_prev(),
            EditCommand::HistoryNext => self.history_next(),
            EditCommand::SearchBackward => self.search_history(true),
            EditCommand::SearchForward => self.search_history(false),
            EditCommand::ScreenSize { rows, cols } => {
                tracing::trace!(rows, cols, "screen size report");
                buffer.set_screen_width(usize::try_from(cols).unwrap_or(usize::MAX));
            }
            EditCommand::Noop => {}
        }
        Ok(())
    }

    fn submit(&mut self) {
        let line = self.shared.buffer.finish("\n");
        {
            let mut history = self.shared.history();
            if self.shared.auto_save_history {
                history.push(&line);
            } else {
                history.reset_position();
            }
        }
        self.shared.mailbox.put(LineResult::line(line_bytes(&line)));
    }

    /// Abandon the line and report it as interrupted. The loop keeps going.
    fn interrupt(&mut self) {
        let line = self.shared.buffer.finish("^C\n");
        self.shared.history().reset_position();
        self.shared.mailbox.put(LineResult {
            line: line_bytes(&line),
            error: Some(Error::Interrupted),
        });
    }

    fn complete(&mut self) -> Result<()> {
        let buffer = &self.shared.buffer;
        let Some(completer) = &self.shared.auto_complete else {
            buffer.bell();
            return Ok(());
        };
        let (line, pos) = buffer.with_state(|s| (s.runes().to_vec(), s.cursor()));
        let (mut candidates, replaced) = completer.complete(&line, pos);
        match candidates.len() {
            0 => buffer.bell(),
            1 => buffer.write(&candidates[0]),
            _ => {
                let head = buffer.rune_slice(-isize::try_from(replaced).unwrap_or(isize::MAX));
                let common = aggregate(&mut candidates);
                if common.is_empty() {
                    let listing = candidates
                        .iter()
                        .map(|rest| head.iter().chain(rest).collect::<String>())
                        .collect::<Vec<_>>()
                        .join("  ");
                    buffer.write_output(format!("{listing}\n").as_bytes())?;
                } else {
                    buffer.write(&common);
                }
            }
        }
        Ok(())
    }

    fn history_prev(&mut self) {
        let buffer = &self.shared.buffer;
        let mut history = self.shared.history();
        let leaving_current = history.at_current();
        match history.older() {
            Some(entry) => {
                if leaving_current {
                    buffer.backup();
                }
                buffer.set(&entry);
            }
            None => buffer.bell(),
        }
    }

    fn history_next(&mut self) {
        let buffer = &self.shared.buffer;
        let mut history = self.shared.history();
        match history.newer() {
            Some(Newer::Entry(entry)) => buffer.set(&entry),
            Some(Newer::Current) => {
                if !buffer.restore() {
                    buffer.set(&[]);
                }
            }
            None => buffer.bell(),
        }
    }

    fn search_history(&mut self, backward: bool) {
        let buffer = &self.shared.buffer;
        let pattern = match self.search.take() {
            Some(pattern) => pattern,
            None => buffer.runes(),
        };
        if pattern.is_empty() {
            buffer.bell();
            return;
        }
        let mut history = self.shared.history();
        let leaving_current = history.at_current();
        match history.search(&pattern, backward) {
            Some(hit) => {
                if leaving_current {
                    buffer.backup();
                }
                buffer.set_with_cursor(hit.offset, &hit.entry);
            }
            None => buffer.bell(),
        }
        self.search = Some(pattern);
    }
}
