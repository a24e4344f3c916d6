use std::io::{ErrorKind, Write};
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{FrameError, Result};
use crate::format::FrameFormat;
use crate::frame::Frame;

/// Pause between retries when a non-blocking sink reports it is full.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(1);

/// Configuration for a raw frame writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameWriterConfig {
    /// Format every written frame must have.
    pub format: FrameFormat,
    /// Upper bound on how long one frame may wait for room in the sink.
    ///
    /// Only enforceable when the sink is non-blocking; a blocking sink stalls
    /// inside `write` where no deadline can reach it.
    pub write_timeout: Option<Duration>,
}

impl FrameWriterConfig {
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            write_timeout: None,
        }
    }
}

/// Writes whole raw frames to any `Write` sink.
///
/// Frames go out back to back with no header, which is what rawvideo
/// demuxers expect. Each call either delivers the full frame or fails with
/// the number of bytes that made it across.
pub struct RawFrameWriter<T> {
    inner: T,
    config: FrameWriterConfig,
    frames_written: u64,
    bytes_written: u64,
}

impl<T: Write> RawFrameWriter<T> {
    /// Create a writer that accepts frames of `format` and blocks without deadline.
    pub fn new(inner: T, format: FrameFormat) -> Self {
        Self::with_config(inner, FrameWriterConfig::new(format))
    }

    /// Create a writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameWriterConfig) -> Self {
        Self {
            inner,
            config,
            frames_written: 0,
            bytes_written: 0,
        }
    }

    /// Write one complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.format() != self.config.format {
            return Err(FrameError::FormatMismatch {
                expected: self.config.format,
                actual: frame.format(),
            });
        }

        self.write_payload(frame.as_bytes())?;
        self.flush()?;
        self.frames_written += 1;
        trace!(frame = self.frames_written, bytes = frame.len(), "frame written");
        Ok(())
    }

    fn write_payload(&mut self, data: &[u8]) -> Result<()> {
        let expected = data.len();
        let started = Instant::now();
        let mut offset = 0usize;

        let result = loop {
            if offset >= expected {
                break Ok(());
            }
            match self.inner.write(&data[offset..]) {
                Ok(0) => break Err(closed_at(offset, expected)),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if let Err(err) = self.wait_for_room(started, offset, expected) {
                        break Err(err);
                    }
                }
                Err(err) if is_peer_closed(&err) => break Err(closed_at(offset, expected)),
                Err(err) => break Err(FrameError::Io(err)),
            }
        };

        self.bytes_written += offset as u64;
        result
    }

    fn wait_for_room(&self, started: Instant, written: usize, expected: usize) -> Result<()> {
        if let Some(timeout) = self.config.write_timeout {
            if started.elapsed() >= timeout {
                return Err(FrameError::Timeout {
                    timeout,
                    written,
                    expected,
                });
            }
        }
        thread::sleep(WOULD_BLOCK_BACKOFF);
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Frames fully delivered so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bytes accepted by the sink so far, including those of failed frames.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameWriterConfig {
        &self.config
    }
}

fn is_peer_closed(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::WriteZero
    )
}

fn closed_at(written: usize, expected: usize) -> FrameError {
    if written == 0 {
        FrameError::ChannelClosed
    } else {
        FrameError::PartialWrite { written, expected }
    }
}
