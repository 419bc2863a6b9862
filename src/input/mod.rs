//! Keyboard input: control bytes, escape decoding, dispatch tables and the
//! input multiplexer.

mod command;
mod escape;
pub mod keys;
mod stdin;

pub use command::{EditCommand, command_for_byte, command_for_escape};
pub use escape::{
    ESCAPE_BUFFER_CAPACITY, EscapeAccumulator, EscapeKeyEvent, EscapeStep, decode_escape,
};
pub use keys::encode_control_chars;
pub use stdin::{ExtendedStdin, InputSource, StdinWriter, poll_fd};
