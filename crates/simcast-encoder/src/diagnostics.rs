use std::collections::VecDeque;
use std::io::Read;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

/// Bounded tail of an encoder's diagnostic output.
///
/// Cloning shares the same buffer. Only the most recent `capacity` bytes are
/// kept; older output is dropped and the snapshot is marked as truncated.
#[derive(Debug, Clone)]
pub struct DiagnosticsBuffer {
    inner: Arc<Mutex<Tail>>,
}

#[derive(Debug)]
struct Tail {
    bytes: VecDeque<u8>,
    capacity: usize,
    truncated: bool,
}

impl DiagnosticsBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Tail {
                bytes: VecDeque::with_capacity(capacity.min(64 * 1024)),
                capacity,
                truncated: false,
            })),
        }
    }

    /// Append output, evicting the oldest bytes past capacity.
    pub fn push(&self, data: &[u8]) {
        let mut tail = self.lock();
        if tail.capacity == 0 {
            tail.truncated |= !data.is_empty();
            return;
        }
        let data = if data.len() > tail.capacity {
            tail.truncated = true;
            &data[data.len() - tail.capacity..]
        } else {
            data
        };
        let overflow = (tail.bytes.len() + data.len()).saturating_sub(tail.capacity);
        if overflow > 0 {
            tail.bytes.drain(..overflow);
            tail.truncated = true;
        }
        tail.bytes.extend(data);
    }

    /// Current contents as text. Never waits on the producer.
    pub fn snapshot(&self) -> String {
        let tail = self.lock();
        let (front, back) = tail.bytes.as_slices();
        let mut raw = Vec::with_capacity(front.len() + back.len());
        raw.extend_from_slice(front);
        raw.extend_from_slice(back);
        let text = String::from_utf8_lossy(&raw);
        let text = text.trim_end();
        if tail.truncated && !text.is_empty() {
            format!("[earlier output truncated]\n{text}")
        } else {
            text.to_string()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock().bytes.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Tail> {
        // A panic while holding the lock leaves the byte queue intact.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

const READ_CHUNK: usize = 4096;

/// Longest partial line held for the debug relay before it is flushed.
const MAX_RELAY_LINE: usize = 1024;

/// Background thread copying encoder output into a [`DiagnosticsBuffer`].
pub(crate) struct DrainThread {
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

impl DrainThread {
    /// Wait for the thread to reach EOF, for at most `timeout` when given.
    ///
    /// Returns false if the thread was still running and has been detached.
    /// Another process holding the pipe open keeps the thread alive.
    pub(crate) fn join(self, timeout: Option<Duration>) -> bool {
        if let Some(timeout) = timeout {
            if let Err(RecvTimeoutError::Timeout) = self.done.recv_timeout(timeout) {
                return false;
            }
        }
        if self.handle.join().is_err() {
            warn!("encoder stderr drain thread panicked");
        }
        true
    }
}

/// Copy `reader` into `buffer` on a background thread until EOF.
///
/// Output is stored as it arrives, in fixed-size chunks, whether or not it
/// ends in a newline. Lines split on `\n` or `\r` are also logged at debug
/// level.
pub(crate) fn spawn_drain<R>(mut reader: R, buffer: DiagnosticsBuffer) -> std::io::Result<DrainThread>
where
    R: Read + Send + 'static,
{
    let (done_tx, done) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("simcast-encoder-stderr".to_string())
        .spawn(move || {
            let mut chunk = [0u8; READ_CHUNK];
            let mut pending = Vec::new();
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        buffer.push(&chunk[..n]);
                        relay_lines(&mut pending, &chunk[..n]);
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        debug!(error = %err, "encoder stderr drain stopped");
                        break;
                    }
                }
            }
            log_line(&pending);
            let _ = done_tx.send(());
        })?;
    Ok(DrainThread { handle, done })
}

fn relay_lines(pending: &mut Vec<u8>, data: &[u8]) {
    for &byte in data {
        if byte == b'\n' || byte == b'\r' {
            log_line(pending);
            pending.clear();
        } else {
            pending.push(byte);
            if pending.len() >= MAX_RELAY_LINE {
                log_line(pending);
                pending.clear();
            }
        }
    }
}

fn log_line(line: &[u8]) {
    if line.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(line);
    debug!(line = %text.trim_end(), "encoder stderr");
}
