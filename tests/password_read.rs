//! Echo-free password reads against files and the mock terminal.

mod common;

use common::mock_terminal::MockTerminal;
use rawline::Error;
use rawline::terminal::{TerminalState, read_password, read_password_with};
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;

fn file_with(contents: &[u8]) -> std::fs::File {
    let mut file = tempfile::tempfile().expect("temp file");
    file.write_all(contents).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    file
}

#[test]
fn test_password_read_toggles_echo_and_restores() {
    common::init_tracing();
    let tty = MockTerminal::tty(80, 24);
    let file = file_with(b"hunter2\n");
    let secret = read_password_with(&tty, file.as_raw_fd()).unwrap();
    assert_eq!(secret, b"hunter2");

    let applied = tty.applied();
    assert_eq!(applied.len(), 2);
    assert!(!applied[0].echo());
    assert!(applied[0].canonical());
    assert_eq!(applied[1], TerminalState::default());
}

#[test]
fn test_password_read_of_empty_input_is_end_of_input() {
    let tty = MockTerminal::tty(80, 24);
    let file = file_with(b"");
    let err = read_password_with(&tty, file.as_raw_fd()).unwrap_err();
    assert!(matches!(err, Error::EndOfInput));
    // restored even on failure
    assert_eq!(tty.current(), TerminalState::default());
}

#[test]
fn test_password_read_spans_several_chunks() {
    let tty = MockTerminal::tty(80, 24);
    let long = "correct horse battery staple, twice over";
    let file = file_with(format!("{long}\n").as_bytes());
    let secret = read_password_with(&tty, file.as_raw_fd()).unwrap();
    assert_eq!(secret, long.as_bytes());
}

#[test]
fn test_password_read_needs_a_terminal() {
    let file = file_with(b"never read\n");
    let err = read_password(file.as_raw_fd()).unwrap_err();
    assert!(matches!(err, Error::Io(_)));

    let pipe = MockTerminal::pipe();
    assert!(read_password_with(&pipe, file.as_raw_fd()).is_err());
    assert!(pipe.applied().is_empty());
}
