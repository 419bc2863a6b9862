//! The editable line and its on-screen rendering.
//!
//! Key types:
//!
//! - [`LineState`]: text, cursor, kill register and backup slot, plus the
//!   byte sequences that draw and erase it
//! - [`LineBuffer`]: a `LineState` and its writer behind one lock
//!
//! # Examples
//!
//! ```
//! use rawline::text::LineState;
//!
//! let mut line = LineState::new("> ", None, true, 80);
//! line.insert(&['h', 'i']);
//! line.move_backward();
//! assert_eq!(line.render_bytes(), b"> hi\x08");
//! ```

mod buffer;
mod line;
mod render;

pub use buffer::LineBuffer;
pub use line::LineState;
