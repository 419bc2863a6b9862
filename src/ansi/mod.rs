//! ANSI escape sequence generation for line rendering.
//!
//! The renderer assumes a VT100/ANSI-compatible terminal; there is no
//! capability database.

pub mod sequences;

pub use sequences::{cursor_forward, sgr};
