//! Display width calculation and line-wrap splitting for terminal rendering.

use unicode_width::UnicodeWidthChar;

/// Columns a tab occupies when rendered. Tabs are expanded to spaces.
pub const TAB_WIDTH: usize = 4;

/// Get the display width of a character in terminal columns.
///
/// Tab is [`TAB_WIDTH`], control and zero-width characters (combining and
/// enclosing marks, format characters) are 0, East Asian wide characters
/// (Han, Hangul, Hiragana, Katakana and friends) are 2, everything else is 1.
#[inline]
#[must_use]
pub fn width(c: char) -> usize {
    // Fast path: ASCII printable characters are always width 1
    if (' '..='~').contains(&c) {
        return 1;
    }
    if c == '\t' {
        return TAB_WIDTH;
    }
    if c.is_control() {
        return 0;
    }
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Sum of [`width`] over a rune slice.
#[must_use]
pub fn width_all(s: &[char]) -> usize {
    s.iter().map(|&c| width(c)).sum()
}

/// Remove `ESC [ ... m` color runs.
///
/// Only used to measure prompt width; the prompt itself is rendered with its
/// color codes intact. An unterminated run drops just the escape character.
#[must_use]
pub fn strip_ansi_color(s: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(s.len());
    let mut pos = 0;
    while pos < s.len() {
        if s[pos] == '\x1b' && s.get(pos + 1) == Some(&'[') {
            if let Some(rel) = s[pos + 2..].iter().position(|&c| c == 'm') {
                pos += rel + 3;
            } else {
                pos += 1;
            }
            continue;
        }
        out.push(s[pos]);
        pos += 1;
    }
    out
}

/// Split runes into screen rows.
///
/// The first row starts `start` columns in (the prompt). A row is closed once
/// its accumulated width reaches `screen_width`. The result always has at
/// least one, possibly empty, segment; a trailing empty segment means the
/// text ends exactly on a wrap boundary. A `screen_width` of 0 means the
/// width is unknown and yields a single segment.
#[must_use]
pub fn split_by_line(start: usize, screen_width: usize, s: &[char]) -> Vec<String> {
    if screen_width == 0 {
        return vec![s.iter().collect()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = start;
    for &c in s {
        current_width += width(c);
        current.push(c);
        if current_width >= screen_width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
    }
    lines.push(current);
    lines
}

/// Number of screen rows needed for `width` columns (ceiling division).
#[must_use]
pub fn line_count(screen_width: usize, width: usize) -> usize {
    if screen_width == 0 {
        return usize::from(width > 0);
    }
    width.div_ceil(screen_width)
}

/// Word classifier for word motions: anything outside `[A-Za-z0-9]` breaks.
#[inline]
#[must_use]
pub fn is_word_break(c: char) -> bool {
    !c.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runes(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_ascii_width() {
        assert_eq!(width('a'), 1);
        assert_eq!(width_all(&runes("hello")), 5);
    }

    #[test]
    fn test_tab_width() {
        assert_eq!(width('\t'), TAB_WIDTH);
        assert_eq!(width_all(&runes("a\tb")), TAB_WIDTH + 2);
    }

    #[test]
    fn test_cjk_width() {
        assert_eq!(width('漢'), 2);
        assert_eq!(width('한'), 2);
        assert_eq!(width('ひ'), 2);
        assert_eq!(width('カ'), 2);
        assert_eq!(width_all(&runes("漢字")), 4);
    }

    #[test]
    fn test_zero_width() {
        assert_eq!(width('\u{0301}'), 0); // combining acute
        assert_eq!(width('\u{20DD}'), 0); // enclosing circle
        assert_eq!(width('\u{200D}'), 0); // zero width joiner
        assert_eq!(width('\x07'), 0);
        assert_eq!(width('\x7f'), 0);
    }

    #[test]
    fn test_strip_ansi_color() {
        let prompt = runes("\x1b[1;32m>>\x1b[0m ");
        assert_eq!(strip_ansi_color(&prompt), runes(">> "));
        assert_eq!(width_all(&strip_ansi_color(&prompt)), 3);
    }

    #[test]
    fn test_strip_ansi_color_unterminated() {
        assert_eq!(strip_ansi_color(&runes("a\x1b[31")), runes("a[31"));
        assert_eq!(strip_ansi_color(&runes("a\x1b")), runes("a\x1b"));
    }

    #[test]
    fn test_split_by_line_with_prompt() {
        let lines = split_by_line(2, 5, &runes("abcdefgh"));
        assert_eq!(lines, vec!["abc", "defgh", ""]);
    }

    #[test]
    fn test_split_by_line_always_one_segment() {
        assert_eq!(split_by_line(0, 10, &[]), vec![String::new()]);
        assert_eq!(split_by_line(0, 0, &runes("abc")), vec!["abc"]);
    }

    #[test]
    fn test_split_by_line_wide_chars() {
        let lines = split_by_line(0, 3, &runes("漢字"));
        assert_eq!(lines, vec!["漢字", ""]);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(10, 0), 0);
        assert_eq!(line_count(10, 10), 1);
        assert_eq!(line_count(10, 11), 2);
        assert_eq!(line_count(0, 11), 1);
    }

    #[test]
    fn test_is_word_break() {
        assert!(!is_word_break('a'));
        assert!(!is_word_break('Z'));
        assert!(!is_word_break('7'));
        assert!(is_word_break(' '));
        assert!(is_word_break('-'));
        assert!(is_word_break('é'));
    }
}
