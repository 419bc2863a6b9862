//! Locked line buffer that keeps the screen in sync with its [`LineState`].
//!
//! Every editing call goes through one template: erase the frame on screen,
//! apply the mutation, render the new frame, and hand the erase and render
//! bytes to the writer in a single `write_all`. When the buffer is not
//! interactive the mutation is applied silently.

use super::LineState;
use crate::ansi::sequences::{BELL, CLEAR_SCREEN, CURSOR_HOME};
use crate::error::{Error, Result};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Inner {
    state: LineState,
    out: Box<dyn Write + Send>,
    output_broken: bool,
    write_error: Option<Error>,
}

impl Inner {
    fn update<R>(&mut self, f: impl FnOnce(&mut LineState) -> R) -> R {
        if !self.state.interactive() {
            return f(&mut self.state);
        }
        let mut bytes = self.state.take_clean().unwrap_or_default();
        let result = f(&mut self.state);
        bytes.extend(self.state.take_render());
        let _ = self.emit(&bytes);
        result
    }

    /// Like [`update`](Self::update), but only redraws a frame that is
    /// already on screen. Between reads nothing is written.
    fn update_shown<R>(&mut self, f: impl FnOnce(&mut LineState) -> R) -> R {
        if !self.state.needs_clean() {
            return f(&mut self.state);
        }
        self.update(f)
    }

    /// Write and flush. A failure is also kept for [`LineBuffer::take_write_error`].
    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        if self.output_broken {
            self.write_error.get_or_insert(Error::BrokenPipe);
            return Err(Error::BrokenPipe);
        }
        if let Err(err) = self.out.write_all(bytes).and_then(|()| self.out.flush()) {
            tracing::warn!(error = %err, len = bytes.len(), "terminal write failed");
            if err.kind() == io::ErrorKind::BrokenPipe {
                self.output_broken = true;
            }
            let err = Error::from(err);
            self.write_error.get_or_insert_with(|| err.clone());
            return Err(err);
        }
        Ok(())
    }
}

/// Editable line plus the writer its frames are drawn on.
///
/// All methods take `&self`; the internal mutex is the only serialization
/// point for the text, the cursor and the output device.
pub struct LineBuffer {
    inner: Mutex<Inner>,
}

impl LineBuffer {
    /// Wrap a line state and the writer it renders to.
    pub fn new(state: LineState, out: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                out,
                output_broken: false,
                write_error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut LineState) -> R) -> R {
        self.lock().update(f)
    }

    /// Run `f` against a consistent view of the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&LineState) -> R) -> R {
        f(&self.lock().state)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.with_state(LineState::cursor)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.with_state(LineState::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with_state(LineState::is_empty)
    }

    /// Copy of the text.
    #[must_use]
    pub fn runes(&self) -> Vec<char> {
        self.with_state(|s| s.runes().to_vec())
    }

    /// See [`LineState::rune_slice`].
    #[must_use]
    pub fn rune_slice(&self, count: isize) -> Vec<char> {
        self.with_state(|s| s.rune_slice(count))
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.with_state(LineState::width)
    }

    #[must_use]
    pub fn width_to(&self, idx: usize) -> usize {
        self.with_state(|s| s.width_to(idx))
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.with_state(LineState::line_count)
    }

    #[must_use]
    pub fn idx_line(&self) -> usize {
        self.with_state(LineState::idx_line)
    }

    #[must_use]
    pub fn cursor_line_count(&self) -> usize {
        self.with_state(LineState::cursor_line_count)
    }

    #[must_use]
    pub fn is_cursor_at_end(&self) -> bool {
        self.with_state(LineState::is_cursor_at_end)
    }

    #[must_use]
    pub fn interactive(&self) -> bool {
        self.with_state(LineState::interactive)
    }

    #[must_use]
    pub fn screen_width(&self) -> usize {
        self.with_state(LineState::screen_width)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Change the prompt. A frame on screen is redrawn with it.
    pub fn set_prompt(&self, prompt: &str) {
        self.lock().update_shown(|s| s.set_prompt(prompt));
    }

    pub fn set_mask(&self, mask: Option<char>) {
        self.lock().update_shown(|s| s.set_mask(mask));
    }

    /// Switch output on or off. Turning it off erases the frame first.
    pub fn set_interactive(&self, on: bool) {
        let mut inner = self.lock();
        if !on {
            if let Some(bytes) = inner.state.take_clean() {
                let _ = inner.emit(&bytes);
            }
        }
        inner.state.set_interactive(on);
    }

    /// Apply a new screen width, redrawing a frame that is on screen.
    pub fn set_screen_width(&self, screen_width: usize) {
        tracing::trace!(screen_width, "screen width changed");
        self.lock()
            .update_shown(|s| s.set_screen_width(screen_width));
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Insert runes at the cursor. An empty insert does nothing.
    pub fn write(&self, s: &[char]) {
        if s.is_empty() {
            return;
        }
        self.update(|state| state.insert(s));
    }

    /// Insert a string at the cursor.
    pub fn write_str(&self, s: &str) {
        self.write(&s.chars().collect::<Vec<_>>());
    }

    pub fn move_line_start(&self) {
        self.update(LineState::move_line_start);
    }

    pub fn move_line_end(&self) {
        self.update(LineState::move_line_end);
    }

    pub fn move_backward(&self) {
        self.update(LineState::move_backward);
    }

    pub fn move_forward(&self) {
        self.update(LineState::move_forward);
    }

    pub fn move_prev_word(&self) -> bool {
        self.update(LineState::move_prev_word)
    }

    pub fn move_next_word(&self) -> bool {
        self.update(LineState::move_next_word)
    }

    pub fn move_end_word(&self) -> bool {
        self.update(LineState::move_end_word)
    }

    pub fn move_to(&self, ch: char, before: bool, reverse: bool) -> bool {
        self.update(|s| s.move_to(ch, before, reverse))
    }

    pub fn backspace(&self) {
        self.update(LineState::backspace);
    }

    pub fn delete(&self) -> bool {
        self.update(LineState::delete)
    }

    pub fn delete_word(&self) {
        self.update(LineState::delete_word);
    }

    pub fn back_escape_word(&self) {
        self.update(LineState::back_escape_word);
    }

    pub fn kill(&self) {
        self.update(LineState::kill);
    }

    pub fn kill_front(&self) {
        self.update(LineState::kill_front);
    }

    /// Insert the kill register. An empty register does nothing.
    pub fn yank(&self) -> bool {
        let mut inner = self.lock();
        if inner.state.kill_register().is_empty() {
            return false;
        }
        inner.update(LineState::yank)
    }

    pub fn transpose(&self) {
        self.update(LineState::transpose);
    }

    /// See [`LineState::replace`].
    pub fn replace(&self, ch: char) {
        self.update(|s| s.replace(ch));
    }

    pub fn erase(&self) {
        self.update(LineState::erase);
    }

    pub fn set_with_cursor(&self, idx: usize, text: &[char]) {
        self.update(|s| s.set_with_cursor(idx, text));
    }

    pub fn set(&self, text: &[char]) {
        self.update(|s| s.set(text));
    }

    pub fn backup(&self) {
        self.lock().state.backup();
    }

    /// Recall the backup snapshot and redraw. False when none was taken.
    pub fn restore(&self) -> bool {
        let mut inner = self.lock();
        if !inner.state.has_backup() {
            return false;
        }
        inner.update(LineState::restore)
    }

    /// Take the text out. The frame on screen stays where it is.
    pub fn reset(&self) -> Vec<char> {
        self.lock().state.reset()
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Redraw without changing anything.
    pub fn refresh(&self) {
        self.update(|_| ());
    }

    /// Erase the frame on screen, if any.
    pub fn clean(&self) {
        let mut inner = self.lock();
        if let Some(bytes) = inner.state.take_clean() {
            let _ = inner.emit(&bytes);
        }
    }

    /// True while a rendered frame is on screen.
    #[must_use]
    pub fn has_frame(&self) -> bool {
        self.with_state(LineState::needs_clean)
    }

    /// Commit the line: redraw it with the cursor at the end, write
    /// `suffix` after it, and take the text out. The committed frame is
    /// left on screen.
    pub fn finish(&self, suffix: &str) -> Vec<char> {
        let mut inner = self.lock();
        if inner.state.interactive() {
            let mut bytes = inner.state.take_clean().unwrap_or_default();
            inner.state.move_line_end();
            bytes.extend(inner.state.take_render());
            bytes.extend_from_slice(suffix.as_bytes());
            let _ = inner.emit(&bytes);
        }
        inner.state.reset()
    }

    /// Paint `[start, end)` with an SGR style without touching the text.
    ///
    /// # Panics
    ///
    /// Panics if `end < start` or `end` is past the end of the text.
    pub fn set_style(&self, start: usize, end: usize, style: &str) {
        let mut inner = self.lock();
        let bytes = inner.state.style_bytes(start, end, style);
        if inner.state.interactive() {
            let _ = inner.emit(&bytes);
        }
    }

    /// Ring the terminal bell.
    pub fn bell(&self) {
        let mut inner = self.lock();
        if inner.state.interactive() {
            let _ = inner.emit(BELL.as_bytes());
        }
    }

    /// Clear the whole screen and draw the frame at the top.
    pub fn clear_screen(&self) {
        let mut inner = self.lock();
        if !inner.state.interactive() {
            return;
        }
        inner.state.set_needs_clean(false);
        let mut bytes = format!("{CURSOR_HOME}{CLEAR_SCREEN}").into_bytes();
        bytes.extend(inner.state.take_render());
        let _ = inner.emit(&bytes);
    }

    /// Write bytes that are not part of the line. A frame on screen is
    /// erased first and drawn again below the bytes.
    pub fn write_output(&self, bytes: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        match inner.state.take_clean() {
            Some(mut out) => {
                out.extend_from_slice(bytes);
                out.extend(inner.state.take_render());
                inner.emit(&out)
            }
            None => inner.emit(bytes),
        }
    }

    /// Write control bytes that leave the visible screen unchanged, such as
    /// a cursor position request.
    pub fn write_control(&self, bytes: &[u8]) -> Result<()> {
        self.lock().emit(bytes)
    }

    /// First write failure since the last call, if any.
    pub fn take_write_error(&self) -> Option<Error> {
        self.lock().write_error.take()
    }

    /// Treat every later write as failed with [`Error::BrokenPipe`].
    pub fn mark_output_broken(&self) {
        self.lock().output_broken = true;
    }
}

impl fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("LineBuffer")
            .field("state", &inner.state)
            .field("output_broken", &inner.output_broken)
            .finish_non_exhaustive()
    }
}
