//! Blocking process invocation with a timeout.

use disparity_core::{ToolOutput, TIMEOUT_EXIT_CODE};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How long pipes may stay open after the tool itself has exited.
const EXIT_GRACE: Duration = Duration::from_millis(100);

/// Runs `program` with `args`, capturing trimmed stdout and stderr.
///
/// Never fails. A process that cannot be spawned reports exit code 1 with
/// the error in stderr; one that outlives `timeout` is killed, reaped and
/// reported with [`TIMEOUT_EXIT_CODE`].
///
/// On unix the tool runs in its own process group. Anything it leaves
/// behind holding the output pipes is killed along with it, so the call is
/// bounded by `timeout` plus a short grace period.
pub fn run_command(program: &Path, args: &[String], timeout: Duration) -> ToolOutput {
    let start = Instant::now();
    let deadline = start + timeout;
    debug!(program = %program.display(), ?args, "invoking tool");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            return ToolOutput::failure(
                1,
                format!("failed to run {}: {}", program.display(), err),
            )
            .with_duration(start.elapsed())
        }
    };

    // Both pipes are drained while polling for exit.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait_until(&mut child, deadline) {
        Ok(Some(status)) => status,
        Ok(None) => {
            debug!(program = %program.display(), ?timeout, "tool timed out");
            return ToolOutput::failure(
                TIMEOUT_EXIT_CODE,
                format!(
                    "command timed out after {:.1}s: {} {}",
                    timeout.as_secs_f64(),
                    program.display(),
                    args.join(" ")
                ),
            )
            .with_duration(start.elapsed());
        }
        Err(err) => {
            kill_group(&mut child);
            return ToolOutput::failure(1, format!("failed to wait for {}: {}", program.display(), err))
                .with_duration(start.elapsed())
        }
    };

    let settle = deadline.min(Instant::now() + EXIT_GRACE);
    let mut out = receive(&stdout, settle);
    let mut err = receive(&stderr, settle);
    if out.is_none() || err.is_none() {
        debug!(program = %program.display(), "output pipes still open after exit; killing process group");
        kill_group(&mut child);
        let settle = Instant::now() + EXIT_GRACE;
        out = out.or_else(|| receive(&stdout, settle));
        err = err.or_else(|| receive(&stderr, settle));
    }

    ToolOutput {
        exit_code: exit_code(status),
        stdout: out.unwrap_or_default(),
        stderr: err.unwrap_or_default(),
        duration: start.elapsed(),
    }
}

/// Polls the child until it exits or `deadline` passes.
///
/// Returns `Ok(None)` after killing the process group and reaping a child
/// that timed out.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_group(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kills every process in the child's group, the child included.
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    // The child was spawned as its group leader, so its pid is the pgid.
    // A pgid stays reserved while any member lives, even after the leader
    // has been reaped.
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: kill(2) with a negative pid only signals; no memory is touched.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    let _ = child.kill();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    match pipe {
        Some(mut pipe) => {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                let _ = tx.send(buf);
            });
        }
        None => {
            let _ = tx.send(Vec::new());
        }
    }
    rx
}

/// Waits until `until` for a drained pipe; `None` if it is still open.
fn receive(rx: &Receiver<Vec<u8>>, until: Instant) -> Option<String> {
    rx.recv_timeout(until.saturating_duration_since(Instant::now()))
        .ok()
        .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Returns true if `program` names an existing file.
pub fn binary_exists(program: &Path) -> bool {
    program.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> ToolOutput {
        run_command(
            Path::new("/bin/sh"),
            &["-c".to_string(), script.to_string()],
            timeout,
        )
    }

    #[test]
    fn test_captures_trimmed_output() {
        let out = sh("echo '  addi a0, a0, 1  '; echo oops >&2", Duration::from_secs(10));
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "addi a0, a0, 1");
        assert_eq!(out.stderr, "oops");
    }

    #[test]
    fn test_nonzero_exit() {
        let out = sh("echo invalid >&2; exit 3", Duration::from_secs(10));
        assert_eq!(out.exit_code, 3);
        assert!(!out.succeeded());
        assert_eq!(out.stderr, "invalid");
    }

    #[test]
    fn test_timeout_kills_child() {
        let out = sh("exec sleep 5", Duration::from_millis(100));
        assert_eq!(out.exit_code, TIMEOUT_EXIT_CODE);
        assert!(out.timed_out());
        assert!(out.stderr.contains("timed out"));
        assert!(out.duration < Duration::from_secs(5));
    }

    #[test]
    fn test_background_process_does_not_block() {
        let start = Instant::now();
        let out = sh("sleep 3 & echo addi a0, a0, 1", Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_secs(2), "blocked {:?}", start.elapsed());
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "addi a0, a0, 1");
    }

    #[test]
    fn test_timeout_kills_whole_group() {
        let start = Instant::now();
        let out = sh("sleep 3 & sleep 3", Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_secs(2), "blocked {:?}", start.elapsed());
        assert!(out.timed_out());
    }

    #[test]
    fn test_missing_program() {
        let out = run_command(
            Path::new("/nonexistent/disassembler"),
            &[],
            Duration::from_secs(1),
        );
        assert_eq!(out.exit_code, 1);
        assert!(out.stderr.contains("failed to run"));
        assert!(!binary_exists(Path::new("/nonexistent/disassembler")));
    }

    #[test]
    fn test_signal_death() {
        let out = sh("kill -9 $$", Duration::from_secs(10));
        assert_eq!(out.exit_code, 128 + 9);
    }
}
