//! `rawline` - interactive line editing for Unix terminals
//!
//! A line editor core: an editable line that keeps its on-screen frame in
//! sync, an escape-sequence decoder, an input multiplexer that lets callers
//! type ahead programmatically, a raw-mode controller, and a session that
//! runs the read-dispatch loop and hands finished lines to callers.

// Crate-level lint configuration
#![warn(unsafe_code)] // Unsafe code needs justification (required for termios FFI)
#![allow(clippy::cast_possible_truncation)] // Terminal sizes fit in u16
#![allow(clippy::module_name_repetitions)] // Allow LineBuffer in text::buffer etc
#![allow(clippy::struct_excessive_bools)] // Session state needs multiple flags
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference

pub mod ansi;
pub mod error;
pub mod event;
pub mod input;
pub mod session;
pub mod terminal;
pub mod text;
pub mod unicode;

// Re-export core types at crate root
pub use error::{Error, Result};
pub use event::{EventBus, Subscription, TerminalEvent};

// Re-export input types
pub use input::{EditCommand, EscapeKeyEvent, ExtendedStdin, InputSource, StdinWriter};

// Re-export commonly used types
pub use session::{AutoCompleter, CancelToken, Config, LineResult, RuneFilter, Terminal};
pub use terminal::{RawModeController, TerminalControl, TerminalMonitor, is_tty, terminal_size};
pub use text::{LineBuffer, LineState};
