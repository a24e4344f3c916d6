use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use simcast_frame::{Frame, FrameWriterConfig, RawFrameWriter};
use tracing::{debug, info, warn};

use crate::config::EncoderConfig;
use crate::diagnostics::{spawn_drain, DiagnosticsBuffer, DrainThread};
use crate::error::{EncoderError, ExitReport, Result};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Time allowed for the stderr drain to finish once the exit deadline is spent.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Lifecycle of a spawned encoder.
///
/// A handle only exists once the process is running; terminal states are
/// never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Running,
    /// Exited with a success status after `close()`.
    Exited(ExitReport),
    /// Exited with a failure status, or could not be waited on.
    Failed(Option<ExitReport>),
}

/// Owns one external encoder process and its pipes.
///
/// Raw frames go to the process's stdin. Its stderr is drained on a
/// background thread into a bounded [`DiagnosticsBuffer`], so a verbose
/// encoder never stalls on a full diagnostic pipe. On unix the encoder leads
/// its own process group, so a kill also reaches anything it started.
/// Dropping a handle that was never closed kills and reaps the process.
pub struct EncoderProcess {
    program: String,
    child: Child,
    writer: Option<RawFrameWriter<ChildStdin>>,
    stderr_drain: Option<DrainThread>,
    diagnostics: DiagnosticsBuffer,
    exit_timeout: Option<Duration>,
    state: EncoderState,
}

impl EncoderProcess {
    /// Start the encoder described by `config`.
    pub fn spawn(config: &EncoderConfig) -> Result<Self> {
        config.validate()?;
        let args = config.command_args();

        let mut command = Command::new(&config.program);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command
            .spawn()
            .map_err(|source| EncoderError::Spawn {
                program: config.program.clone(),
                source,
            })?;

        // From here on, an early return drops `process`, which kills the child.
        let mut process = Self {
            program: config.program.clone(),
            child,
            writer: None,
            stderr_drain: None,
            diagnostics: DiagnosticsBuffer::with_capacity(config.diagnostics_capacity),
            exit_timeout: config.exit_timeout,
            state: EncoderState::Running,
        };

        let stdin = process.child.stdin.take().ok_or_else(|| {
            EncoderError::Io(std::io::Error::other("encoder stdin was not captured"))
        })?;
        if config.write_timeout.is_some() {
            set_nonblocking(&stdin)?;
        }
        if let Some(stderr) = process.child.stderr.take() {
            process.stderr_drain = Some(spawn_drain(stderr, process.diagnostics.clone())?);
        }
        process.writer = Some(RawFrameWriter::with_config(
            stdin,
            FrameWriterConfig {
                format: config.input,
                write_timeout: config.write_timeout,
            },
        ));

        info!(
            pid = process.pid(),
            program = %config.program,
            args = ?args,
            format = %config.input,
            rate = config.frame_rate,
            "encoder spawned"
        );
        Ok(process)
    }

    /// Write one frame to the encoder's input (blocking).
    ///
    /// Once the channel has failed, every later call fails with
    /// [`EncoderError::ChannelClosed`] without touching the pipe.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(EncoderError::ChannelClosed);
        };

        match writer.write_frame(frame) {
            Ok(()) => Ok(()),
            Err(err) => {
                let err = EncoderError::from(err);
                if err.is_channel_failure() {
                    warn!(
                        pid = self.child.id(),
                        frames = writer.frames_written(),
                        error = %err,
                        "encoder input channel failed"
                    );
                    self.writer = None;
                }
                Err(err)
            }
        }
    }

    /// Close the encoder's input and wait for it to exit.
    ///
    /// Can be called once. A failure status is reported as
    /// [`EncoderError::AbnormalExit`] together with the buffered diagnostics.
    pub fn close(&mut self) -> Result<ExitReport> {
        if self.state != EncoderState::Running {
            return Err(EncoderError::AlreadyClosed);
        }

        let frames = self
            .writer
            .take()
            .map(|writer| writer.frames_written())
            .unwrap_or_default();
        debug!(pid = self.pid(), frames, "encoder input closed, waiting for exit");

        let deadline = self.exit_timeout.map(|timeout| Instant::now() + timeout);
        let waited = self.wait_for_exit();
        self.join_stderr_drain(deadline);

        match waited {
            Ok(report) if report.success => {
                self.state = EncoderState::Exited(report);
                info!(pid = self.pid(), status = %report, "encoder exited");
                Ok(report)
            }
            Ok(report) => {
                self.state = EncoderState::Failed(Some(report));
                warn!(pid = self.pid(), status = %report, "encoder exited abnormally");
                Err(EncoderError::AbnormalExit {
                    status: report,
                    diagnostics: self.diagnostics(),
                })
            }
            Err(err) => {
                self.state = EncoderState::Failed(None);
                Err(err)
            }
        }
    }

    fn wait_for_exit(&mut self) -> Result<ExitReport> {
        let Some(timeout) = self.exit_timeout else {
            return Ok(self.child.wait()?.into());
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status.into());
            }
            if Instant::now() >= deadline {
                warn!(pid = self.pid(), ?timeout, "encoder did not exit in time, killing");
                self.kill();
                let _ = self.child.wait();
                return Err(EncoderError::Timeout {
                    operation: "exit",
                    timeout,
                });
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }

    /// Wait for the stderr drain, bounded by `deadline` when one is set.
    fn join_stderr_drain(&mut self, deadline: Option<Instant>) {
        let Some(drain) = self.stderr_drain.take() else {
            return;
        };
        let budget = deadline.map(|deadline| {
            deadline
                .saturating_duration_since(Instant::now())
                .max(DRAIN_GRACE)
        });
        if !drain.join(budget) {
            warn!(
                pid = self.pid(),
                "encoder stderr still open after exit, detaching drain"
            );
        }
    }

    /// Kill the encoder and, on unix, the rest of its process group.
    fn kill(&mut self) {
        #[cfg(unix)]
        {
            if let Ok(pid) = libc::pid_t::try_from(self.child.id()) {
                // SAFETY: the group was created for this child at spawn and
                // the child is not yet reaped, so the id cannot be reused.
                unsafe {
                    libc::kill(-pid, libc::SIGKILL);
                }
            }
        }
        let _ = self.child.kill();
    }

    /// Tail of the encoder's stderr captured so far.
    pub fn diagnostics(&self) -> String {
        self.diagnostics.snapshot()
    }

    /// OS process id of the encoder.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Whether frames can still be written.
    pub fn is_channel_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Frames fully delivered so far.
    pub fn frames_written(&self) -> u64 {
        self.writer
            .as_ref()
            .map(|writer| writer.frames_written())
            .unwrap_or_default()
    }
}

impl Drop for EncoderProcess {
    fn drop(&mut self) {
        if self.state != EncoderState::Running {
            return;
        }
        drop(self.writer.take());
        if !matches!(self.child.try_wait(), Ok(Some(_))) {
            warn!(pid = self.child.id(), "encoder still running on drop, killing");
            self.kill();
        }
        let _ = self.child.wait();
    }
}

impl std::fmt::Debug for EncoderProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderProcess")
            .field("program", &self.program)
            .field("pid", &self.child.id())
            .field("state", &self.state)
            .field("channel_open", &self.writer.is_some())
            .finish()
    }
}

#[cfg(unix)]
fn set_nonblocking(stdin: &ChildStdin) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let fd = stdin.as_raw_fd();
    // SAFETY: `fd` is the open write end of the stdin pipe, owned by `stdin`
    // for the duration of both calls.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: as above; only the O_NONBLOCK status flag is added.
    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_nonblocking(_stdin: &ChildStdin) -> std::io::Result<()> {
    warn!("write timeouts are not enforced on this platform");
    Ok(())
}
