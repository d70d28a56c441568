//! Helpers for running child processes with timeouts, cancellation and bounded output.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// How often a waiting caller re-checks its [`CancelToken`].
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared flag that asks in-flight work to stop. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("output reader thread panicked")]
    ReaderPanicked,
}

impl ProcessError {
    fn io(context: &'static str) -> impl FnOnce(io::Error) -> ProcessError {
        move |source| ProcessError::Io { context, source }
    }
}

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
    pub cancelled: bool,
}

impl CommandOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn stdout_truncated_notice(&self, label: &str) -> String {
        if self.stdout_truncated > 0 {
            format!(
                "\n[{label} stdout truncated {} bytes]\n",
                self.stdout_truncated
            )
        } else {
            String::new()
        }
    }

    pub fn stderr_truncated_notice(&self, label: &str) -> String {
        if self.stderr_truncated > 0 {
            format!(
                "\n[{label} stderr truncated {} bytes]\n",
                self.stderr_truncated
            )
        } else {
            String::new()
        }
    }
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// `stdin` is written in full and then closed so the child sees EOF. Output is
/// read concurrently while the child runs; `output_limit_bytes` bounds what is
/// kept in memory (the rest is drained and counted). The child and its process
/// group are killed when the timeout elapses or `cancel` fires, whichever comes
/// first.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
    cancel: &CancelToken,
) -> Result<CommandOutput, ProcessError> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    // Own process group, so a kill also reaches grandchildren holding our pipes.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!(%program, "spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, %program, "failed to spawn command");
            return Err(ProcessError::Spawn { program, source: e });
        }
    };

    if let Some(input) = stdin
        && let Some(mut child_stdin) = child.stdin.take()
    {
        match child_stdin.write_all(input) {
            Ok(()) => {}
            // The child may exit before reading everything; its output still counts.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("child closed stdin early");
            }
            Err(e) => {
                error!(err = %e, "failed to write stdin, killing");
                let _ = stop_child(&mut child);
                return Err(ProcessError::io("write stdin")(e));
            }
        }
    }

    let stdout = child.stdout.take().ok_or_else(|| {
        ProcessError::io("take stdout")(io::Error::other("stdout was not piped"))
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        ProcessError::io("take stderr")(io::Error::other("stderr was not piped"))
    })?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let deadline = Instant::now() + timeout;
    let mut timed_out = false;
    let mut cancelled = false;
    let finished = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Some(status) = child
            .wait_timeout(remaining.min(POLL_INTERVAL))
            .map_err(ProcessError::io("wait for command"))?
        {
            break Some(status);
        }
        if cancel.is_cancelled() {
            cancelled = true;
            break None;
        }
        if Instant::now() >= deadline {
            timed_out = true;
            break None;
        }
    };

    let status = match finished {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                timed_out, cancelled, "stopping command, killing"
            );
            stop_child(&mut child).map_err(ProcessError::io("wait command after kill"))?
        }
    };

    let (stdout, stdout_truncated) = join_output(stdout_handle)?;
    let (stderr, stderr_truncated) = join_output(stderr_handle)?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, cancelled, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
        cancelled,
    })
}

/// Kill the child with its process group and reap it.
fn stop_child(child: &mut Child) -> io::Result<ExitStatus> {
    kill_process_tree(child);
    child.wait()
}

/// SIGKILL the child's process group, falling back to the child alone.
#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_process_tree(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this child at spawn.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == -1 {
        let err = io::Error::last_os_error();
        debug!(err = %err, "killpg failed, killing child only");
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
}

fn join_output(
    handle: thread::JoinHandle<io::Result<(Vec<u8>, usize)>>,
) -> Result<(Vec<u8>, usize), ProcessError> {
    match handle.join() {
        Ok(result) => result.map_err(ProcessError::io("read output")),
        Err(_) => Err(ProcessError::ReaderPanicked),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> io::Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk)?;
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

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::CommandExt;

    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_stdout_fed_from_stdin() {
        let output = run_command_with_timeout(
            sh("cat"),
            Some(b"init cube\nexit\n"),
            Duration::from_secs(5),
            1000,
            &CancelToken::new(),
        )
        .expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout_text(), "init cube\nexit\n");
        assert!(!output.timed_out);
    }

    #[test]
    fn truncates_beyond_limit() {
        let output = run_command_with_timeout(
            sh("printf 0123456789"),
            None,
            Duration::from_secs(5),
            4,
            &CancelToken::new(),
        )
        .expect("run");
        assert_eq!(output.stdout, b"0123");
        assert_eq!(output.stdout_truncated, 6);
        assert!(output.stdout_truncated_notice("engine").contains("6 bytes"));
    }

    #[test]
    fn kills_on_timeout() {
        let started = Instant::now();
        let output = run_command_with_timeout(
            sh("exec sleep 10"),
            None,
            Duration::from_millis(200),
            1000,
            &CancelToken::new(),
        )
        .expect("run");
        assert!(output.timed_out);
        assert!(!output.status.success());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn timeout_reaches_grandchildren_holding_pipes() {
        let started = Instant::now();
        let output = run_command_with_timeout(
            sh("sleep 5; echo late"),
            None,
            Duration::from_millis(200),
            1000,
            &CancelToken::new(),
        )
        .expect("run");
        assert!(output.timed_out);
        assert!(output.stdout.is_empty());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn early_stdin_close_keeps_output() {
        let output = run_command_with_timeout(
            sh("exec 0<&-; echo done"),
            Some(&vec![b'x'; 1 << 20]),
            Duration::from_secs(5),
            1000,
            &CancelToken::new(),
        )
        .expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout_text(), "done\n");
    }

    #[test]
    fn stop_child_reaps_whole_group() {
        let mut cmd = sh("sleep 5 & sleep 5; echo late");
        cmd.stdout(Stdio::piped()).process_group(0);
        let mut child = cmd.spawn().expect("spawn");
        let mut stdout = child.stdout.take().expect("stdout");
        let started = Instant::now();
        let status = stop_child(&mut child).expect("stop");
        assert!(!status.success());
        let mut rest = Vec::new();
        stdout.read_to_end(&mut rest).expect("read");
        assert!(rest.is_empty());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn kills_on_cancel() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });
        let started = Instant::now();
        let output = run_command_with_timeout(
            sh("sleep 5; echo late"),
            None,
            Duration::from_secs(30),
            1000,
            &cancel,
        )
        .expect("run");
        canceller.join().expect("join canceller");
        assert!(output.cancelled);
        assert!(!output.timed_out);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn spawn_failure_keeps_io_kind() {
        let err = run_command_with_timeout(
            Command::new("/definitely/not/a/real/engine"),
            None,
            Duration::from_secs(1),
            1000,
            &CancelToken::new(),
        )
        .unwrap_err();
        match err {
            ProcessError::Spawn { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
