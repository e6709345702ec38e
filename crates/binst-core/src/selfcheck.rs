//! Post-install smoke test: run the binary with its version-query arguments
//! and require exit status 0 within a deadline.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{InstallError, SelfCheckFailure};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Attempts when exec races with a write handle still open in a forked child.
const SPAWN_ATTEMPTS: u32 = 5;

/// A passed self-check.
#[derive(Debug, Clone)]
pub struct SelfCheckReport {
    /// First non-empty line of stdout (usually the version string).
    pub banner: Option<String>,
    pub elapsed: Duration,
}

/// Run `binary args...` and expect a zero exit status within `timeout`.
///
/// The deadline covers the whole run: the child runs in its own process
/// group, and a descendant that keeps stdout or stderr open past the
/// deadline counts as a timeout. The group is killed either way.
pub fn selfcheck(
    binary: &Path,
    args: &[String],
    timeout: Duration,
) -> Result<SelfCheckReport, InstallError> {
    let fail = |reason| InstallError::SelfCheck {
        path: binary.to_path_buf(),
        reason,
    };
    let timed_out = |child: &mut Child| {
        kill_group(child);
        let _ = child.wait();
        tracing::warn!(path = %binary.display(), ?timeout, "self-check timed out");
        fail(SelfCheckFailure::TimedOut(timeout))
    };

    let started = Instant::now();
    let deadline = started + timeout;
    let mut child = spawn(binary, args).map_err(|e| fail(SelfCheckFailure::Spawn(e)))?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait_with_deadline(&mut child, deadline) {
        Ok(Some(status)) => status,
        Ok(None) => return Err(timed_out(&mut child)),
        Err(e) => {
            kill_group(&mut child);
            let _ = child.wait();
            return Err(fail(SelfCheckFailure::Spawn(e)));
        }
    };
    let (stdout, stderr) = match (collect(stdout, deadline), collect(stderr, deadline)) {
        (Some(out), Some(err)) => (out, err),
        _ => return Err(timed_out(&mut child)),
    };
    let elapsed = started.elapsed();

    if !status.success() {
        tracing::warn!(path = %binary.display(), %status, "self-check failed");
        return Err(fail(SelfCheckFailure::Exited { status, stderr }));
    }

    let banner = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string);
    tracing::info!(
        path = %binary.display(),
        banner = banner.as_deref().unwrap_or(""),
        elapsed_ms = elapsed.as_millis() as u64,
        "self-check passed"
    );
    Ok(SelfCheckReport { banner, elapsed })
}

fn spawn(binary: &Path, args: &[String]) -> io::Result<Child> {
    let mut attempt = 1;
    loop {
        let mut cmd = Command::new(binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        match cmd.spawn() {
            Err(e) if is_text_busy(&e) && attempt < SPAWN_ATTEMPTS => {
                tracing::debug!(attempt, "binary busy, retrying exec");
                thread::sleep(Duration::from_millis(20 * u64::from(attempt)));
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// `ETXTBSY`: another thread's fork still holds the freshly written binary
/// open for writing. Transient; it clears once that child execs or exits.
#[cfg(unix)]
fn is_text_busy(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::ETXTBSY)
}

#[cfg(not(unix))]
fn is_text_busy(_e: &io::Error) -> bool {
    false
}

/// Kill the child's process group, which includes anything it left running.
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: kill(2) takes plain integers and touches no memory. The child
    // was spawned with process_group(0), so its pid is its group id and the
    // negated value addresses only that group.
    let r = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if r != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid, "killing self-check process group failed: {}", err);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    let _ = child.kill();
}

fn wait_with_deadline(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Read a pipe to completion on a helper thread so a chatty child never
/// blocks on a full pipe.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<String>> {
    pipe.map(|mut p| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
        rx
    })
}

/// Pipe contents, or `None` if the pipe is still open at `deadline`.
fn collect(rx: Option<Receiver<String>>, deadline: Instant) -> Option<String> {
    let Some(rx) = rx else {
        return Some(String::new());
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(s) => Some(s),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}
