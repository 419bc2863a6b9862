//! Constant ANSI escape sequences used by the line renderer.

/// Reset all attributes to default.
pub const RESET: &str = "\x1b[0m";

/// Clear entire screen.
pub const CLEAR_SCREEN: &str = "\x1b[2J";

/// Clear from cursor to end of screen.
pub const CLEAR_SCREEN_BELOW: &str = "\x1b[J";

/// Clear entire line.
pub const CLEAR_LINE: &str = "\x1b[2K";

/// Clear from cursor to end of line.
pub const CLEAR_LINE_RIGHT: &str = "\x1b[K";

/// Move cursor to home position (1,1).
pub const CURSOR_HOME: &str = "\x1b[H";

/// Move cursor up one row.
pub const CURSOR_UP: &str = "\x1b[A";

/// Carriage return: column 0 of the current row.
pub const CARRIAGE_RETURN: &str = "\r";

/// Move cursor one column left.
pub const BACKSPACE: &str = "\x08";

/// Audible bell.
pub const BELL: &str = "\x07";

/// Step over a pending wrap so the cursor sits at the start of the next row.
pub const WRAP_GLUE: &str = " \x08";

/// Save cursor, jump to the far bottom-right corner, request a position
/// report, restore cursor. The report carries the screen size.
pub const PROBE_SCREEN_SIZE: &str = "\x1b7\x1b[999;999H\x1b[6n\x1b8";

/// Move cursor right `n` columns.
#[must_use]
pub fn cursor_forward(n: usize) -> String {
    format!("\x1b[{n}C")
}

/// Select graphic rendition with raw parameters, e.g. `"1;31"`.
#[must_use]
pub fn sgr(params: &str) -> String {
    format!("\x1b[{params}m")
}
