//! Editable line state: text, cursor, kill register and backup slot.
//!
//! [`LineState`] is the unsynchronized core shared by every editing
//! operation. It never writes to a device; rendering produces byte vectors
//! (see the `render` module) and [`LineBuffer`](super::LineBuffer) owns the
//! lock and the writer.
//!
//! # Examples
//!
//! ```
//! use rawline::text::LineState;
//!
//! let mut line = LineState::new("> ", None, false, 80);
//! line.insert(&"hello world".chars().collect::<Vec<_>>());
//! line.move_line_start();
//! line.move_next_word();
//! assert_eq!(line.cursor(), 6);
//!
//! line.kill();
//! line.yank();
//! line.yank();
//! assert_eq!(line.to_string(), "hello worldworld");
//! ```

use crate::unicode::{is_word_break, strip_ansi_color, width_all};
use std::fmt;

/// One saved `(text, cursor)` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Snapshot {
    text: Vec<char>,
    cursor: usize,
}

/// Editable line with cursor.
///
/// Invariant: `cursor <= text.len()` after every operation. Killed spans are
/// always copied into the kill register, never shared with `text`.
#[derive(Clone, Debug)]
pub struct LineState {
    prompt: Vec<char>,
    prompt_width: usize,
    text: Vec<char>,
    cursor: usize,
    mask: Option<char>,
    interactive: bool,
    screen_width: usize,
    kill_register: Vec<char>,
    backup: Option<Snapshot>,
    /// A rendered frame is on screen and has not been erased yet.
    needs_clean: bool,
}

impl LineState {
    /// Create an empty line.
    ///
    /// `screen_width` of 0 means the width is unknown and disables wrap math.
    #[must_use]
    pub fn new(prompt: &str, mask: Option<char>, interactive: bool, screen_width: usize) -> Self {
        let mut state = Self {
            prompt: Vec::new(),
            prompt_width: 0,
            text: Vec::new(),
            cursor: 0,
            mask,
            interactive,
            screen_width,
            kill_register: Vec::new(),
            backup: None,
            needs_clean: false,
        };
        state.set_prompt(prompt);
        state
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Cursor index into the text.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of runes in the text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True if the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The editable text.
    #[must_use]
    pub fn runes(&self) -> &[char] {
        &self.text
    }

    /// UTF-8 encoding of the text.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Contents of the kill register.
    #[must_use]
    pub fn kill_register(&self) -> &[char] {
        &self.kill_register
    }

    /// Prompt runes, color codes included.
    #[must_use]
    pub fn prompt(&self) -> &[char] {
        &self.prompt
    }

    /// Display width of the prompt, color codes excluded.
    #[must_use]
    pub fn prompt_width(&self) -> usize {
        self.prompt_width
    }

    /// Mask rune, if password masking is on.
    #[must_use]
    pub fn mask(&self) -> Option<char> {
        self.mask
    }

    /// Whether mutations produce terminal output.
    #[must_use]
    pub fn interactive(&self) -> bool {
        self.interactive
    }

    /// Screen width in columns, 0 when unknown.
    #[must_use]
    pub fn screen_width(&self) -> usize {
        self.screen_width
    }

    /// True when a rendered frame is still on screen.
    #[must_use]
    pub fn needs_clean(&self) -> bool {
        self.needs_clean
    }

    pub(crate) fn set_needs_clean(&mut self, on: bool) {
        self.needs_clean = on;
    }

    /// Display width of the whole text.
    #[must_use]
    pub fn width(&self) -> usize {
        width_all(&self.text)
    }

    /// Display width of the text before `idx` (clamped to the length).
    #[must_use]
    pub fn width_to(&self, idx: usize) -> usize {
        width_all(&self.text[..idx.min(self.text.len())])
    }

    /// Runes around the cursor: `count > 0` takes up to `count` runes from
    /// the cursor forward, `count < 0` takes up to `-count` runes before it.
    #[must_use]
    pub fn rune_slice(&self, count: isize) -> Vec<char> {
        let n = count.unsigned_abs();
        if count >= 0 {
            let end = (self.cursor + n).min(self.text.len());
            self.text[self.cursor..end].to_vec()
        } else {
            let start = self.cursor.saturating_sub(n);
            self.text[start..self.cursor].to_vec()
        }
    }

    /// True if the cursor is past the last rune.
    #[must_use]
    pub fn is_cursor_at_end(&self) -> bool {
        self.cursor == self.text.len()
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Replace the prompt and recompute its width.
    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.chars().collect();
        self.prompt_width = width_all(&strip_ansi_color(&self.prompt));
    }

    /// Turn password masking on or off.
    pub fn set_mask(&mut self, mask: Option<char>) {
        self.mask = mask;
    }

    /// Switch between rendering and silent mutation.
    pub fn set_interactive(&mut self, on: bool) {
        self.interactive = on;
    }

    /// Update the screen width (0 = unknown).
    pub fn set_screen_width(&mut self, screen_width: usize) {
        self.screen_width = screen_width;
    }

    // ------------------------------------------------------------------
    // Insertion and movement
    // ------------------------------------------------------------------

    /// Insert runes at the cursor; the cursor advances past them.
    pub fn insert(&mut self, s: &[char]) {
        self.text.splice(self.cursor..self.cursor, s.iter().copied());
        self.cursor += s.len();
    }

    pub fn move_line_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn move_backward(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_forward(&mut self) {
        if self.cursor < self.text.len() {
            self.cursor += 1;
        }
    }

    /// Move to the start of the previous word. Reaching the line start counts
    /// as success; only a cursor already at 0 fails.
    pub fn move_prev_word(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = (1..self.cursor)
            .rev()
            .find(|&i| self.is_word_start(i))
            .unwrap_or(0);
        true
    }

    /// Move to the start of the next word, or the line end.
    pub fn move_next_word(&mut self) -> bool {
        self.cursor = (self.cursor + 1..self.text.len())
            .find(|&i| self.is_word_start(i))
            .unwrap_or(self.text.len());
        true
    }

    /// Move onto the last rune of the current or next word, or the line end.
    pub fn move_end_word(&mut self) -> bool {
        let len = self.text.len();
        if self.cursor == len {
            return false;
        }
        // Already on a word's last rune: look at the next word instead.
        if self.cursor + 1 < len
            && !is_word_break(self.text[self.cursor])
            && is_word_break(self.text[self.cursor + 1])
        {
            self.cursor += 1;
        }
        self.cursor = (self.cursor + 1..len)
            .find(|&i| is_word_break(self.text[i]) && !is_word_break(self.text[i - 1]))
            .map_or(len, |i| i - 1);
        true
    }

    /// Jump to the next (or, with `reverse`, previous) occurrence of `ch`.
    ///
    /// With `before` the cursor stops one rune short of the match, on the
    /// side it came from. Returns false and leaves the cursor alone when
    /// there is no match.
    pub fn move_to(&mut self, ch: char, before: bool, reverse: bool) -> bool {
        let found = if reverse {
            (0..self.cursor).rev().find(|&i| self.text[i] == ch)
        } else {
            (self.cursor + 1..self.text.len()).find(|&i| self.text[i] == ch)
        };
        let Some(i) = found else {
            return false;
        };
        self.cursor = match (before, reverse) {
            (true, true) => i + 1,
            (true, false) => i - 1,
            (false, _) => i,
        };
        true
    }

    fn is_word_start(&self, i: usize) -> bool {
        !is_word_break(self.text[i]) && is_word_break(self.text[i - 1])
    }

    // ------------------------------------------------------------------
    // Deletion and the kill register
    // ------------------------------------------------------------------

    /// Delete the rune left of the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.text.remove(self.cursor);
    }

    /// Delete the rune under the cursor into the kill register.
    pub fn delete(&mut self) -> bool {
        if self.cursor == self.text.len() {
            return false;
        }
        let removed = self.text.remove(self.cursor);
        self.push_kill(&[removed]);
        true
    }

    /// Delete forward to the end of the next word into the kill register.
    pub fn delete_word(&mut self) {
        let len = self.text.len();
        if self.cursor == len {
            return;
        }
        let mut init = self.cursor;
        while init < len && is_word_break(self.text[init]) {
            init += 1;
        }
        match (init + 1..len).find(|&i| self.is_word_start(i)) {
            // Keep the separator in front of the following word.
            Some(i) => self.kill_range(self.cursor, i - 1),
            None => self.kill(),
        }
    }

    /// Delete backward to the start of the previous word into the kill register.
    pub fn back_escape_word(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = (1..self.cursor)
            .rev()
            .find(|&i| self.is_word_start(i))
            .unwrap_or(0);
        self.kill_range(start, self.cursor);
        self.cursor = start;
    }

    /// Delete from the cursor to the end into the kill register.
    pub fn kill(&mut self) {
        self.kill_range(self.cursor, self.text.len());
    }

    /// Delete from the start to the cursor into the kill register.
    pub fn kill_front(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.kill_range(0, self.cursor);
        self.cursor = 0;
    }

    /// Insert the kill register at the cursor. Returns false when it is empty.
    pub fn yank(&mut self) -> bool {
        if self.kill_register.is_empty() {
            return false;
        }
        let killed = self.kill_register.clone();
        self.insert(&killed);
        true
    }

    /// Clear the line into the kill register.
    pub fn erase(&mut self) {
        self.kill_register = std::mem::take(&mut self.text);
        self.cursor = 0;
    }

    fn kill_range(&mut self, start: usize, end: usize) {
        self.kill_register = self.text.drain(start..end).collect();
    }

    fn push_kill(&mut self, span: &[char]) {
        self.kill_register = span.to_vec();
    }

    // ------------------------------------------------------------------
    // In-place edits and replacement
    // ------------------------------------------------------------------

    /// Swap the rune before the cursor with the one under it.
    ///
    /// At the line end the last two runes swap; at the start the first two.
    /// A single-rune line only moves the cursor past the rune.
    pub fn transpose(&mut self) {
        let len = self.text.len();
        if len == 1 {
            self.cursor = 1;
        }
        if len < 2 {
            return;
        }
        if self.cursor == 0 {
            self.cursor = 1;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
        self.text.swap(self.cursor, self.cursor - 1);
        self.cursor += 1;
    }

    /// Overwrite the rune under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at the end of the text.
    pub fn replace(&mut self, ch: char) {
        self.text[self.cursor] = ch;
    }

    /// Replace the whole text and place the cursor (clamped to the length).
    pub fn set_with_cursor(&mut self, idx: usize, text: &[char]) {
        self.text = text.to_vec();
        self.cursor = idx.min(self.text.len());
    }

    /// Replace the whole text with the cursor at the end.
    pub fn set(&mut self, text: &[char]) {
        self.set_with_cursor(text.len(), text);
    }

    /// Take the text out, leaving an empty line. The frame on screen is
    /// considered committed and will not be erased.
    pub fn reset(&mut self) -> Vec<char> {
        self.cursor = 0;
        self.needs_clean = false;
        std::mem::take(&mut self.text)
    }

    // ------------------------------------------------------------------
    // Backup slot
    // ------------------------------------------------------------------

    /// Save `(text, cursor)`, overwriting any earlier snapshot.
    pub fn backup(&mut self) {
        self.backup = Some(Snapshot {
            text: self.text.clone(),
            cursor: self.cursor,
        });
    }

    /// Recall the saved snapshot. Returns false when none was taken.
    pub fn restore(&mut self) -> bool {
        let Some(snapshot) = &self.backup else {
            return false;
        };
        self.text.clone_from(&snapshot.text);
        self.cursor = snapshot.cursor;
        true
    }

    /// True if a backup snapshot exists.
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text.iter().try_for_each(|c| fmt::Write::write_char(f, *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, cursor: usize) -> LineState {
        let mut state = LineState::new("", None, false, 0);
        let runes: Vec<char> = text.chars().collect();
        state.set_with_cursor(cursor, &runes);
        state
    }

    fn runes(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_insert_advances_cursor() {
        let mut state = line("ad", 1);
        state.insert(&runes("bc"));
        assert_eq!(state.to_string(), "abcd");
        assert_eq!(state.cursor(), 3);
    }

    #[test]
    fn test_backspace() {
        let mut state = line("abc", 3);
        state.backspace();
        assert_eq!(state.to_string(), "ab");
        assert_eq!(state.cursor(), 2);

        let mut state = line("abc", 0);
        state.backspace();
        assert_eq!(state.to_string(), "abc");
    }

    #[test]
    fn test_movement_clamps() {
        let mut state = line("ab", 0);
        state.move_backward();
        assert_eq!(state.cursor(), 0);
        state.move_line_end();
        state.move_forward();
        assert_eq!(state.cursor(), 2);
        state.move_line_start();
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn test_move_next_word() {
        let mut state = line("hello world", 0);
        assert!(state.move_next_word());
        assert_eq!(state.cursor(), 6);
        assert!(state.move_next_word());
        assert_eq!(state.cursor(), 11);
    }

    #[test]
    fn test_move_prev_word() {
        let mut state = line("hello big world", 15);
        assert!(state.move_prev_word());
        assert_eq!(state.cursor(), 10);
        assert!(state.move_prev_word());
        assert_eq!(state.cursor(), 6);
        assert!(state.move_prev_word());
        assert_eq!(state.cursor(), 0);
        assert!(!state.move_prev_word());
    }

    #[test]
    fn test_move_end_word() {
        let mut state = line("hello world", 0);
        assert!(state.move_end_word());
        assert_eq!(state.cursor(), 4);
        // The last word runs to the edge, which lands past it.
        assert!(state.move_end_word());
        assert_eq!(state.cursor(), 11);
        assert!(!state.move_end_word());
    }

    #[test]
    fn test_move_to() {
        let mut state = line("a,b,c", 0);
        assert!(state.move_to(',', false, false));
        assert_eq!(state.cursor(), 1);
        assert!(state.move_to(',', true, false));
        assert_eq!(state.cursor(), 2);
        assert!(state.move_to('a', true, true));
        assert_eq!(state.cursor(), 1);
        assert!(!state.move_to('z', false, false));
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn test_delete_pushes_kill() {
        let mut state = line("abc", 1);
        assert!(state.delete());
        assert_eq!(state.to_string(), "ac");
        assert_eq!(state.kill_register(), &['b']);

        let mut state = line("abc", 3);
        assert!(!state.delete());
    }

    #[test]
    fn test_delete_word() {
        let mut state = line("hello world", 0);
        state.delete_word();
        assert_eq!(state.to_string(), " world");
        assert_eq!(state.kill_register(), runes("hello").as_slice());

        let mut state = line("hello world", 5);
        state.delete_word();
        assert_eq!(state.to_string(), "hello");
        assert_eq!(state.kill_register(), runes(" world").as_slice());
    }

    #[test]
    fn test_back_escape_word() {
        let mut state = line("git commit -m", 10);
        state.back_escape_word();
        assert_eq!(state.to_string(), "git  -m");
        assert_eq!(state.cursor(), 4);
        assert_eq!(state.kill_register(), runes("commit").as_slice());

        let mut state = line("hello  x", 7);
        state.back_escape_word();
        assert_eq!(state.to_string(), "x");
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn test_kill_and_kill_front() {
        let mut state = line("abcdef", 2);
        state.kill();
        assert_eq!(state.to_string(), "ab");
        assert_eq!(state.kill_register(), &['c', 'd', 'e', 'f']);

        let mut state = line("abcdef", 2);
        state.kill_front();
        assert_eq!(state.to_string(), "cdef");
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.kill_register(), &['a', 'b']);
    }

    #[test]
    fn test_kill_register_is_overwritten() {
        let mut state = line("abcdef", 4);
        state.kill();
        state.move_line_start();
        state.delete();
        assert_eq!(state.kill_register(), &['a']);
    }

    #[test]
    fn test_yank_twice() {
        let mut state = line("abc", 1);
        state.kill();
        assert!(state.yank());
        assert!(state.yank());
        assert_eq!(state.to_string(), "abcbc");
        assert_eq!(state.cursor(), 5);
    }

    #[test]
    fn test_yank_empty_register() {
        let mut state = line("abc", 1);
        assert!(!state.yank());
        assert_eq!(state.to_string(), "abc");
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn test_transpose() {
        let mut state = line("abcd", 2);
        state.transpose();
        assert_eq!(state.to_string(), "acbd");
        assert_eq!(state.cursor(), 3);

        let mut state = line("abcd", 4);
        state.transpose();
        assert_eq!(state.to_string(), "abdc");
        assert_eq!(state.cursor(), 4);

        let mut state = line("ab", 0);
        state.transpose();
        assert_eq!(state.to_string(), "ba");
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn test_transpose_single_rune() {
        let mut state = line("a", 0);
        state.transpose();
        assert_eq!(state.to_string(), "a");
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn test_replace() {
        let mut state = line("abc", 1);
        state.replace('X');
        assert_eq!(state.to_string(), "aXc");
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    #[should_panic]
    fn test_replace_past_end_panics() {
        let mut state = line("abc", 3);
        state.replace('X');
    }

    #[test]
    fn test_erase() {
        let mut state = line("abc", 2);
        state.erase();
        assert!(state.is_empty());
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.kill_register(), &['a', 'b', 'c']);
    }

    #[test]
    fn test_set_clamps_cursor() {
        let mut state = line("", 0);
        state.set_with_cursor(10, &runes("abc"));
        assert_eq!(state.cursor(), 3);
        state.set(&runes("hello"));
        assert_eq!(state.cursor(), 5);
    }

    #[test]
    fn test_backup_restore() {
        let mut state = line("abc", 1);
        assert!(!state.restore());
        state.backup();
        state.insert(&runes("zz"));
        state.kill_front();
        assert!(state.restore());
        assert_eq!(state.to_string(), "abc");
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn test_rune_slice() {
        let state = line("abcdef", 3);
        assert_eq!(state.rune_slice(2), vec!['d', 'e']);
        assert_eq!(state.rune_slice(10), vec!['d', 'e', 'f']);
        assert_eq!(state.rune_slice(-2), vec!['b', 'c']);
        assert_eq!(state.rune_slice(-10), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_prompt_width_ignores_color() {
        let state = LineState::new("\x1b[31mred\x1b[0m> ", None, true, 80);
        assert_eq!(state.prompt_width(), 5);
        assert_eq!(state.prompt().len(), 14);
    }

    #[test]
    fn test_reset_returns_text() {
        let mut state = line("abc", 2);
        state.set_needs_clean(true);
        assert_eq!(state.reset(), runes("abc"));
        assert!(state.is_empty());
        assert_eq!(state.cursor(), 0);
        assert!(!state.needs_clean());
    }
}
