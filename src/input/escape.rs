//! Decoder for the bytes that follow an escape character.
//!
//! Grammar, after the escape itself:
//!
//! ```text
//! char [ attribute [ ';' attribute2 ] { ';' digits } kind ] remainder
//! ```
//!
//! `char` is the first byte. Only `[` (CSI) and `O` (SS3) carry numeric
//! parameters and a terminating `kind`; any other `char` is a complete
//! event on its own (`ESC b`, `ESC ESC`, ...). Bytes after the match are
//! handed back as `remainder` to be processed as ordinary input.

use super::keys::ESC;

/// Bytes buffered after an escape before the run is given up as literal text.
pub const ESCAPE_BUFFER_CAPACITY: usize = 16;

/// One decoded escape sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EscapeKeyEvent {
    /// Byte right after the escape.
    pub ch: u8,
    /// First numeric parameter; `None` when absent, which is not the same as 0.
    pub attribute: Option<u32>,
    /// Second numeric parameter.
    pub attribute2: Option<u32>,
    /// Terminating byte of a CSI/SS3 sequence, 0 for bare `ESC char`.
    pub kind: u8,
    /// Input that followed the sequence.
    pub remainder: Vec<u8>,
}

impl EscapeKeyEvent {
    /// True when neither numeric parameter was given.
    #[must_use]
    pub fn has_no_attributes(&self) -> bool {
        self.attribute.is_none() && self.attribute2.is_none()
    }
}

/// Try to decode `buf`, the bytes after an escape.
///
/// Returns `None` while the sequence is still incomplete.
#[must_use]
pub fn decode_escape(buf: &[u8]) -> Option<EscapeKeyEvent> {
    let (&ch, rest) = buf.split_first()?;
    if ch != b'[' && ch != b'O' {
        return Some(EscapeKeyEvent {
            ch,
            remainder: rest.to_vec(),
            ..EscapeKeyEvent::default()
        });
    }

    let mut pos = 0;
    let attribute = parse_number(rest, &mut pos);
    let mut attribute2 = None;
    if rest.get(pos) == Some(&b';') {
        pos += 1;
        attribute2 = parse_number(rest, &mut pos);
        // Extra parameter groups are accepted and ignored.
        while rest.get(pos) == Some(&b';') {
            pos += 1;
            let _ = parse_number(rest, &mut pos);
        }
    }

    let &kind = rest.get(pos)?;
    Some(EscapeKeyEvent {
        ch,
        attribute,
        attribute2,
        kind,
        remainder: rest[pos + 1..].to_vec(),
    })
}

fn parse_number(buf: &[u8], pos: &mut usize) -> Option<u32> {
    let digits = buf[*pos..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let value = buf[*pos..*pos + digits].iter().fold(0u32, |acc, &b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    });
    *pos += digits;
    Some(value)
}

/// Outcome of feeding bytes to an [`EscapeAccumulator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscapeStep {
    /// A full sequence was decoded.
    Matched(EscapeKeyEvent),
    /// Keep feeding bytes.
    NeedMore,
    /// The buffer filled up without a match: escape plus the buffered bytes,
    /// to be treated as literal input.
    Overflow(Vec<u8>),
}

/// Bounded buffer for an escape sequence that is still arriving.
#[derive(Clone, Debug, Default)]
pub struct EscapeAccumulator {
    buf: Vec<u8>,
    active: bool,
}

impl EscapeAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(ESCAPE_BUFFER_CAPACITY),
            active: false,
        }
    }

    /// True between an escape byte and the end of its sequence.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// An escape byte was read: start a new sequence.
    pub fn start(&mut self) {
        self.active = true;
        self.buf.clear();
    }

    /// Drop whatever was buffered.
    pub fn reset(&mut self) {
        self.active = false;
        self.buf.clear();
    }

    /// Append bytes and try to decode.
    pub fn push(&mut self, bytes: &[u8]) -> EscapeStep {
        self.buf.extend_from_slice(bytes);
        if let Some(event) = decode_escape(&self.buf) {
            self.reset();
            return EscapeStep::Matched(event);
        }
        if self.buf.len() < ESCAPE_BUFFER_CAPACITY {
            return EscapeStep::NeedMore;
        }
        tracing::debug!(len = self.buf.len(), "escape sequence overflowed, passing through");
        let mut literal = Vec::with_capacity(self.buf.len() + 1);
        literal.push(ESC);
        literal.append(&mut self.buf);
        self.reset();
        EscapeStep::Overflow(literal)
    }
}
