//! Screen output for a [`LineState`]: render, erase and styling bytes.
//!
//! Rendering writes the prompt and the whole line left to right, then walks
//! the cursor back to its logical position. Every position on screen is
//! derived from the same wrap rule as [`split_by_line`], so the erase step
//! always knows how many rows the previous frame occupied.
//!
//! ```text
//! prompt "> ", width 8, text "abcdefghij", cursor 3
//!
//!   > abcdef        row 0
//!   ghij            row 1   <- output cursor after the text
//!
//!   walk back: 4 x BS, then (row boundary) up + CR + right 7, then 2 x BS
//! ```

use super::LineState;
use crate::ansi::sequences::{
    BACKSPACE, CARRIAGE_RETURN, CLEAR_LINE, CLEAR_LINE_RIGHT, CLEAR_SCREEN_BELOW, CURSOR_UP,
    RESET, WRAP_GLUE,
};
use crate::ansi::{cursor_forward, sgr};
use crate::unicode::{TAB_WIDTH, line_count, split_by_line, width, width_all};

/// Row and column of a rune position on screen, relative to the prompt's row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScreenPos {
    row: usize,
    col: usize,
}

impl LineState {
    /// Runes as they appear on screen: the mask stands in for every rune
    /// except a trailing newline.
    fn display_runes(&self) -> Vec<char> {
        match self.mask() {
            Some(mask) if !self.is_empty() => {
                let text = self.runes();
                let mut shown = vec![mask; text.len() - 1];
                shown.push(if text[text.len() - 1] == '\n' { '\n' } else { mask });
                shown
            }
            _ => self.runes().to_vec(),
        }
    }

    /// Screen position of every insertion point `0..=len`.
    fn layout(&self, shown: &[char]) -> Vec<ScreenPos> {
        let screen_width = self.screen_width();
        let mut positions = Vec::with_capacity(shown.len() + 1);
        let mut pos = ScreenPos {
            row: 0,
            col: self.prompt_width(),
        };
        positions.push(pos);
        for &c in shown {
            pos.col += width(c);
            if screen_width > 0 && pos.col >= screen_width {
                pos.row += 1;
                pos.col = 0;
            }
            positions.push(pos);
        }
        positions
    }

    /// True when the rendered text ends exactly on a wrap boundary.
    fn ends_on_wrap_edge(&self, shown: &[char]) -> bool {
        self.screen_width() > 0
            && !shown.is_empty()
            && split_by_line(self.prompt_width(), self.screen_width(), shown)
                .last()
                .is_some_and(String::is_empty)
    }

    /// Zero-based wrapped row the cursor is on.
    #[must_use]
    pub fn idx_line(&self) -> usize {
        let shown = self.display_runes();
        split_by_line(
            self.prompt_width(),
            self.screen_width(),
            &shown[..self.cursor()],
        )
        .len()
            - 1
    }

    /// Rows occupied by prompt plus text.
    #[must_use]
    pub fn line_count(&self) -> usize {
        let shown = self.display_runes();
        line_count(self.screen_width(), self.prompt_width() + width_all(&shown))
    }

    /// Rows from the cursor's row to the last row, inclusive of the cursor row.
    #[must_use]
    pub fn cursor_line_count(&self) -> usize {
        self.line_count().saturating_sub(self.idx_line())
    }

    /// Bytes that draw prompt and text and leave the cursor at its index.
    #[must_use]
    pub fn render_bytes(&self) -> Vec<u8> {
        let shown = self.display_runes();
        let mut out: String = self.prompt().iter().collect();
        push_runes(&mut out, &shown);
        if self.ends_on_wrap_edge(&shown) {
            out.push_str(WRAP_GLUE);
        }
        if self.cursor() < shown.len() {
            out.push_str(&self.move_back(&shown, shown.len(), self.cursor()));
        }
        out.into_bytes()
    }

    /// Bytes that erase the frame drawn by [`render_bytes`](Self::render_bytes)
    /// and leave the cursor at column 0 of the prompt's row.
    #[must_use]
    pub fn clean_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        if self.screen_width() == 0 {
            let shown = self.display_runes();
            let occupied = self.prompt_width() + width_all(&shown);
            for _ in 0..occupied {
                out.push_str(BACKSPACE);
                out.push_str(CLEAR_LINE_RIGHT);
            }
        } else {
            out.push_str(CLEAR_SCREEN_BELOW);
            for _ in 0..self.idx_line() {
                out.push_str(CLEAR_LINE);
                out.push_str(CARRIAGE_RETURN);
                out.push_str(CURSOR_UP);
            }
            out.push_str(CLEAR_LINE);
            out.push_str(CARRIAGE_RETURN);
        }
        out.into_bytes()
    }

    /// Erase bytes for the current frame, once per rendered frame.
    ///
    /// Returns `None` when nothing is on screen or output is disabled.
    pub fn take_clean(&mut self) -> Option<Vec<u8>> {
        if !self.needs_clean() || !self.interactive() {
            return None;
        }
        self.set_needs_clean(false);
        Some(self.clean_bytes())
    }

    /// Render bytes for a new frame; the frame will need cleaning.
    pub fn take_render(&mut self) -> Vec<u8> {
        self.set_needs_clean(true);
        self.render_bytes()
    }

    /// Bytes that repaint `[start, end)` wrapped in `ESC [ style m` / reset,
    /// then return the cursor to where it was. The text is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `end < start` or `end` is past the end of the text.
    #[must_use]
    pub fn style_bytes(&self, start: usize, end: usize, style: &str) -> Vec<u8> {
        assert!(end >= start, "style range end {end} < start {start}");
        assert!(
            end <= self.len(),
            "style range end {end} past text length {}",
            self.len()
        );
        let shown = self.display_runes();
        let cursor = self.cursor();
        let mut out = self.move_between(&shown, cursor, start);
        out.push_str(&sgr(style));
        push_runes(&mut out, &shown[start..end]);
        out.push_str(RESET);
        out.push_str(&self.move_between(&shown, end, cursor));
        out.into_bytes()
    }

    fn move_between(&self, shown: &[char], from: usize, to: usize) -> String {
        if to >= from {
            let mut out = String::new();
            push_runes(&mut out, &shown[from..to]);
            out
        } else {
            self.move_back(shown, from, to)
        }
    }

    /// Cursor-repositioning sequence from index `from` back to index `to`.
    ///
    /// Each step inside a row is one backspace per column; a step across a
    /// wrap boundary goes up a row, returns to column 0 and moves right to
    /// the column of the previous rune.
    fn move_back(&self, shown: &[char], from: usize, to: usize) -> String {
        let positions = self.layout(shown);
        let mut out = String::new();
        for idx in (to + 1..=from).rev() {
            let here = positions[idx];
            let prev = positions[idx - 1];
            if here.row > prev.row {
                out.push_str(CURSOR_UP);
                out.push_str(CARRIAGE_RETURN);
                if prev.col > 0 {
                    out.push_str(&cursor_forward(prev.col));
                }
            } else {
                for _ in prev.col..here.col {
                    out.push_str(BACKSPACE);
                }
            }
        }
        out
    }
}

fn push_runes(out: &mut String, runes: &[char]) {
    for &c in runes {
        if c == '\t' {
            out.extend(std::iter::repeat_n(' ', TAB_WIDTH));
        } else {
            out.push(c);
        }
    }
}
