//! Extended stdin: injected bytes served ahead of live device input.
//!
//! ```text
//!  StdinWriter ──write──▶ injected queue ─┐
//!                                         ├──▶ ExtendedStdin::read
//!  device ──drain thread──▶ live queue ───┘
//! ```
//!
//! The drain thread is the only reader of the device. It polls with a short
//! timeout so [`ExtendedStdin::close`] can stop and join it even when the
//! device never produces another byte. Once the device reports end of file
//! or an error, that outcome is kept and returned by every read that finds
//! both queues empty. An interrupted device read is passed on once, as
//! `ErrorKind::Interrupted`, after the live bytes that preceded it.

#![allow(unsafe_code)]

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);
// At least std's stdin buffer size, so reads bypass that buffer and
// `poll_readable` never misses bytes parked in it.
const DRAIN_CHUNK: usize = 8192;

/// A device the drain thread can read from without blocking forever.
pub trait InputSource: Read + Send {
    /// Wait up to `timeout` for input. `Ok(true)` means the next read will
    /// not block (it may return end of file).
    fn poll_readable(&mut self, timeout: Duration) -> io::Result<bool>;
}

/// `poll(2)` a descriptor for input.
pub fn poll_fd(fd: RawFd, timeout: Duration) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    // SAFETY: pfd is a valid pollfd and nfds is 1.
    let result = unsafe { libc::poll(&mut pfd, 1, millis) };
    if result == -1 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    if pfd.revents & libc::POLLNVAL != 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    Ok(result > 0)
}

impl InputSource for io::Stdin {
    fn poll_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        poll_fd(self.as_raw_fd(), timeout)
    }
}

impl InputSource for File {
    fn poll_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        poll_fd(self.as_raw_fd(), timeout)
    }
}

impl InputSource for UnixStream {
    fn poll_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        poll_fd(self.as_raw_fd(), timeout)
    }
}

impl InputSource for Cursor<Vec<u8>> {
    fn poll_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }
}

impl InputSource for io::Empty {
    fn poll_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }
}

/// How the device side ended.
#[derive(Clone, Debug)]
enum DeviceEnd {
    Eof,
    Failed(io::ErrorKind, String),
}

impl DeviceEnd {
    fn to_read_result(&self) -> io::Result<usize> {
        match self {
            Self::Eof => Ok(0),
            Self::Failed(kind, msg) => Err(io::Error::new(*kind, msg.clone())),
        }
    }
}

#[derive(Default)]
struct Queues {
    injected: VecDeque<u8>,
    live: VecDeque<u8>,
    /// Live bytes left before a pending interruption is reported.
    interrupt_after: Option<usize>,
    device_end: Option<DeviceEnd>,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    queues: Mutex<Queues>,
    ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reader half of the multiplexer. See the module docs.
pub struct ExtendedStdin {
    shared: Arc<Shared>,
    drain: Mutex<Option<JoinHandle<()>>>,
}

impl ExtendedStdin {
    /// Start draining `source` on a background thread.
    pub fn new(source: Box<dyn InputSource>) -> io::Result<(Self, StdinWriter)> {
        let shared = Arc::new(Shared::default());
        let drain_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("rawline-stdin".to_string())
            .spawn(move || drain_loop(source, &drain_shared))?;
        let writer = StdinWriter {
            shared: Arc::clone(&shared),
        };
        Ok((
            Self {
                shared,
                drain: Mutex::new(Some(handle)),
            },
            writer,
        ))
    }

    /// Read into `buf`, blocking until injected or live bytes are available.
    ///
    /// Returns `Ok(0)` after end of file or [`close`](Self::close).
    pub fn read_into(&self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut q = self.shared.lock();
        loop {
            if !q.injected.is_empty() {
                return Ok(drain_into(&mut q.injected, buf));
            }
            if q.interrupt_after == Some(0) {
                q.interrupt_after = None;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if !q.live.is_empty() {
                let limit = q.interrupt_after.unwrap_or(usize::MAX).min(buf.len());
                let n = drain_into(&mut q.live, &mut buf[..limit]);
                if let Some(left) = q.interrupt_after.as_mut() {
                    *left -= n;
                }
                return Ok(n);
            }
            if let Some(end) = &q.device_end {
                return end.to_read_result();
            }
            if q.closed {
                return Ok(0);
            }
            q = self
                .shared
                .ready
                .wait(q)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Read one byte; `None` at end of input.
    pub fn read_byte(&self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read_into(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Stop the drain thread and wake blocked readers. Idempotent.
    pub fn close(&self) {
        {
            let mut q = self.shared.lock();
            q.closed = true;
        }
        self.shared.ready.notify_all();
        let handle = self
            .drain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!("stdin drain thread panicked");
            }
        }
    }
}

impl Read for ExtendedStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_into(buf)
    }
}

impl Drop for ExtendedStdin {
    fn drop(&mut self) {
        self.close();
    }
}

/// Writer half: bytes written here are read before any device input.
#[derive(Clone)]
pub struct StdinWriter {
    shared: Arc<Shared>,
}

impl Write for StdinWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut q = self.shared.lock();
            if q.closed {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "extended stdin is closed",
                ));
            }
            q.injected.extend(buf);
        }
        self.shared.ready.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn drain_into(queue: &mut VecDeque<u8>, buf: &mut [u8]) -> usize {
    let n = queue.len().min(buf.len());
    for (slot, byte) in buf.iter_mut().zip(queue.drain(..n)) {
        *slot = byte;
    }
    n
}

fn drain_loop(mut source: Box<dyn InputSource>, shared: &Shared) {
    let mut chunk = [0u8; DRAIN_CHUNK];
    let end = loop {
        if shared.lock().closed {
            return;
        }
        match source.poll_readable(DRAIN_POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => break DeviceEnd::Failed(err.kind(), err.to_string()),
        }
        match source.read(&mut chunk) {
            Ok(0) => break DeviceEnd::Eof,
            Ok(n) => {
                shared.lock().live.extend(&chunk[..n]);
                shared.ready.notify_all();
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                let mut q = shared.lock();
                if q.interrupt_after.is_none() {
                    q.interrupt_after = Some(q.live.len());
                }
                drop(q);
                shared.ready.notify_all();
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => break DeviceEnd::Failed(err.kind(), err.to_string()),
        }
    };
    tracing::debug!(end = ?end, "stdin drain finished");
    shared.lock().device_end = Some(end);
    shared.ready.notify_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn stream_pair() -> (ExtendedStdin, StdinWriter, UnixStream) {
        let (device, feeder) = UnixStream::pair().expect("socket pair");
        let (stdin, writer) = ExtendedStdin::new(Box::new(device)).expect("spawn drain");
        (stdin, writer, feeder)
    }

    #[test]
    fn test_injected_bytes_come_first() {
        let (stdin, mut writer, mut feeder) = stream_pair();
        writer.write_all(b"ab").unwrap();
        feeder.write_all(b"cd").unwrap();
        let mut buf = [0u8; 8];
        let n = stdin.read_into(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ab");
        assert_eq!(stdin.read_byte().unwrap(), Some(b'c'));
        assert_eq!(stdin.read_byte().unwrap(), Some(b'd'));
    }

    #[test]
    fn test_eof_is_sticky() {
        let (stdin, _writer) =
            ExtendedStdin::new(Box::new(Cursor::new(b"x".to_vec()))).expect("spawn drain");
        assert_eq!(stdin.read_byte().unwrap(), Some(b'x'));
        assert_eq!(stdin.read_byte().unwrap(), None);
        assert_eq!(stdin.read_byte().unwrap(), None);
    }

    #[test]
    fn test_injected_still_served_after_eof() {
        let (stdin, mut writer) =
            ExtendedStdin::new(Box::new(io::empty())).expect("spawn drain");
        assert_eq!(stdin.read_byte().unwrap(), None);
        writer.write_all(b"z").unwrap();
        assert_eq!(stdin.read_byte().unwrap(), Some(b'z'));
        assert_eq!(stdin.read_byte().unwrap(), None);
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    impl InputSource for Failing {
        fn poll_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
            Ok(true)
        }
    }

    /// Replays a fixed list of read outcomes.
    struct Scripted(VecDeque<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(err)) => Err(err),
                None => Ok(0),
            }
        }
    }

    impl InputSource for Scripted {
        fn poll_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_interrupted_read_is_reported_once_in_order() {
        let script = Scripted(VecDeque::from([
            Ok(b"ab".to_vec()),
            Err(io::Error::from(io::ErrorKind::Interrupted)),
            Ok(b"cd".to_vec()),
        ]));
        let (stdin, _writer) = ExtendedStdin::new(Box::new(script)).expect("spawn drain");
        assert_eq!(stdin.read_byte().unwrap(), Some(b'a'));
        assert_eq!(stdin.read_byte().unwrap(), Some(b'b'));
        let err = stdin.read_byte().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
        assert_eq!(stdin.read_byte().unwrap(), Some(b'c'));
        assert_eq!(stdin.read_byte().unwrap(), Some(b'd'));
        assert_eq!(stdin.read_byte().unwrap(), None);
    }

    #[test]
    fn test_device_error_is_sticky() {
        let (stdin, _writer) = ExtendedStdin::new(Box::new(Failing)).expect("spawn drain");
        for _ in 0..2 {
            let err = stdin.read_byte().unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        }
    }

    #[test]
    fn test_close_unblocks_reader_and_is_idempotent() {
        let (stdin, mut writer, _feeder) = stream_pair();
        let stdin = Arc::new(stdin);
        let reader = {
            let stdin = Arc::clone(&stdin);
            thread::spawn(move || stdin.read_byte())
        };
        thread::sleep(Duration::from_millis(20));
        stdin.close();
        stdin.close();
        assert_eq!(reader.join().unwrap().unwrap(), None);
        assert_eq!(
            writer.write(b"late").unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn test_live_bytes_arrive_while_waiting() {
        let (stdin, _writer, mut feeder) = stream_pair();
        let stdin = Arc::new(stdin);
        let reader = {
            let stdin = Arc::clone(&stdin);
            thread::spawn(move || stdin.read_byte())
        };
        thread::sleep(Duration::from_millis(20));
        feeder.write_all(b"q").unwrap();
        assert_eq!(reader.join().unwrap().unwrap(), Some(b'q'));
    }
}
