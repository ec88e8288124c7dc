//! Helpers for running child processes with timeouts and bounded output.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// How long to keep draining output after the child is gone.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    /// Stdout and stderr interleaved in the order the child wrote them.
    pub output: Vec<u8>,
    /// Bytes read past `output_limit_bytes` and discarded.
    pub truncated: usize,
    pub timed_out: bool,
}

/// Run a command with a timeout, capturing stdout and stderr through one pipe.
///
/// Output is drained on a helper thread while the child runs so a chatty child
/// cannot block on a full pipe. `output_limit_bytes` bounds the amount kept in
/// memory. The child runs in its own process group on unix. On timeout the
/// whole group is killed and whatever it wrote is returned.
///
/// Descendants that leave the group can keep the pipe open after the child
/// exits. The reader is then abandoned after [`DRAIN_GRACE`] past the deadline
/// and the output is reported as empty.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_combined(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    let (reader, writer) = std::io::pipe().context("create output pipe")?;
    cmd.stdin(Stdio::null())
        .stdout(writer.try_clone().context("clone output pipe")?)
        .stderr(writer);
    #[cfg(unix)]
    std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };
    // `cmd` still owns the parent's write ends; the reader only sees EOF once
    // they are closed.
    drop(cmd);

    let started = Instant::now();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver is gone only when the reader was abandoned.
        let _ = tx.send(read_stream_limited(reader, output_limit_bytes));
    });

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            kill_tree(&mut child)?;
            child.wait().context("wait command after kill")?
        }
    };

    let drain_for = timeout.saturating_sub(started.elapsed()) + DRAIN_GRACE;
    let (output, truncated) = match rx.recv_timeout(drain_for) {
        Ok(result) => result.context("read output")?,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(
                drain_secs = drain_for.as_secs(),
                "output pipe still held open by a descendant, abandoning reader"
            );
            (Vec::new(), 0)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            return Err(anyhow!("output reader thread panicked"));
        }
    };

    if truncated > 0 {
        warn!(truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        output,
        truncated,
        timed_out,
    })
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = i32::try_from(child.id()).context("child pid out of range")?;
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => Ok(()),
        // The group may already be gone; make sure the direct child is reaped.
        Err(nix::errno::Errno::ESRCH) => child.kill().context("kill command"),
        Err(e) => Err(e).context("kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> Result<()> {
    child.kill().context("kill command")
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
