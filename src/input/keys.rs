//! Control bytes the read loop reacts to.

pub const CTRL_A: u8 = 0x01;
pub const CTRL_B: u8 = 0x02;
pub const CTRL_C: u8 = 0x03;
pub const CTRL_D: u8 = 0x04;
pub const CTRL_E: u8 = 0x05;
pub const CTRL_F: u8 = 0x06;
pub const CTRL_G: u8 = 0x07;
pub const CTRL_H: u8 = 0x08;
pub const CTRL_I: u8 = 0x09;
pub const CTRL_J: u8 = 0x0a;
pub const CTRL_K: u8 = 0x0b;
pub const CTRL_L: u8 = 0x0c;
pub const CTRL_M: u8 = 0x0d;
pub const CTRL_N: u8 = 0x0e;
pub const CTRL_P: u8 = 0x10;
pub const CTRL_R: u8 = 0x12;
pub const CTRL_S: u8 = 0x13;
pub const CTRL_T: u8 = 0x14;
pub const CTRL_U: u8 = 0x15;
pub const CTRL_Y: u8 = 0x19;
pub const CTRL_Z: u8 = 0x1a;

/// Escape, the first byte of every terminal control sequence.
pub const ESC: u8 = 0x1b;

/// What most terminals send for the backspace key.
pub const DEL: u8 = 0x7f;

pub const LINE_START: u8 = CTRL_A;
pub const BACKWARD: u8 = CTRL_B;
pub const INTERRUPT: u8 = CTRL_C;
pub const DELETE: u8 = CTRL_D;
pub const LINE_END: u8 = CTRL_E;
pub const FORWARD: u8 = CTRL_F;
pub const BELL: u8 = CTRL_G;
pub const TAB: u8 = CTRL_I;
pub const ENTER: u8 = CTRL_M;
pub const KILL: u8 = CTRL_K;
pub const CLEAR: u8 = CTRL_L;
pub const NEXT: u8 = CTRL_N;
pub const PREV: u8 = CTRL_P;
pub const BCK_SEARCH: u8 = CTRL_R;
pub const FWD_SEARCH: u8 = CTRL_S;
pub const TRANSPOSE: u8 = CTRL_T;
pub const KILL_FRONT: u8 = CTRL_U;
pub const YANK: u8 = CTRL_Y;

/// Make control bytes printable: `0x01` becomes `^A`, `0x7f` becomes `^?`.
/// Every other byte is copied as is.
#[must_use]
pub fn encode_control_chars(p: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(p.len());
    for &b in p {
        match b {
            0x00..=0x1f => out.extend_from_slice(&[b'^', b + 0x40]),
            DEL => out.extend_from_slice(b"^?"),
            _ => out.push(b),
        }
    }
    out
}
