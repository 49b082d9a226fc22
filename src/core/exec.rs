//! Bounded-runtime child-process executor.
//!
//! Forks, redirects the child's stdout/stderr into a pipe, and polls with a 100ms
//! tick until the child exits, the runtime budget is exceeded, or the process-wide
//! termination flag fires — escalating from SIGTERM to repeated SIGKILL against the
//! child's own process group.

use std::os::fd::{IntoRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, fork, pipe, read, setpgid, ForkResult, Pid};

use crate::error::ExecError;

const POLL_TICK: Duration = Duration::from_millis(100);
const INITIAL_BUFFER_CAPACITY: usize = 4096;
/// Well-known fd numbers for stdout/stderr, avoided importing libc directly for
/// just two constants.
const STDOUT_FD: RawFd = 1;
const STDERR_FD: RawFd = 2;

/// Captured output of a completed (or forcibly terminated) child, always
/// containing at least the bytes observed before escalation.
pub struct CapturedOutput {
    pub bytes: Vec<u8>,
}

/// Runs `command` under `/bin/sh -c`, enforcing `runtime` as a wall-clock budget and
/// escalating through `kill_attempts` SIGKILLs beyond the first SIGTERM if the
/// child does not exit in time or `terminating` becomes true mid-flight.
pub fn execute(
    command: &str,
    runtime: Duration,
    kill_attempts: u32,
    terminating: &Arc<AtomicBool>,
) -> Result<CapturedOutput, ExecError> {
    let (read_fd, write_fd) = make_pipe()?;

    match unsafe { fork() }.map_err(|_| ExecError::Fork)? {
        ForkResult::Child => {
            // Never returns on success.
            run_child(read_fd, write_fd, command);
        }
        ForkResult::Parent { child } => {
            let _ = close(write_fd);
            set_nonblocking(read_fd)?;
            let result = poll_until_done(read_fd, child, runtime, kill_attempts, terminating);
            let _ = close(read_fd);
            result
        }
    }
}

fn make_pipe() -> Result<(RawFd, RawFd), ExecError> {
    let (r, w) = pipe().map_err(|_| ExecError::Pipe)?;
    Ok((r.into_raw_fd(), w.into_raw_fd()))
}

/// Executed only in the forked child. Places itself in its own process group so
/// the parent can signal the whole subtree, rewires stdout/stderr into the pipe,
/// and execs `/bin/sh -c command`. Exits 127 if exec itself fails.
fn run_child(read_fd: RawFd, write_fd: RawFd, command: &str) -> ! {
    let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
    let _ = close(read_fd);

    let _ = dup2(write_fd, STDOUT_FD);
    let _ = dup2(write_fd, STDERR_FD);
    if write_fd > STDERR_FD {
        let _ = close(write_fd);
    }

    let err = Command::new("/bin/sh").arg("-c").arg(command).exec();
    let _ = err;
    std::process::exit(127);
}

fn set_nonblocking(fd: RawFd) -> Result<(), ExecError> {
    fcntl(fd, FcntlArg::F_SETFL(OFlag::O_NONBLOCK)).map_err(|_| ExecError::Pipe)?;
    Ok(())
}

fn poll_until_done(
    read_fd: RawFd,
    child: Pid,
    runtime: Duration,
    kill_attempts: u32,
    terminating: &Arc<AtomicBool>,
) -> Result<CapturedOutput, ExecError> {
    let start = Instant::now();
    let mut buffer: Vec<u8> = Vec::with_capacity(INITIAL_BUFFER_CAPACITY);
    let mut escalation_stage: u32 = 0;
    let mut reaped = false;

    loop {
        drain_readable(read_fd, &mut buffer)?;

        if !reaped {
            match waitpid(child, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => {}
                Ok(_) => reaped = true,
                Err(Errno::ECHILD) => reaped = true,
                Err(_) => {}
            }
        }

        if reaped {
            // One more drain pass: output written just before exit may still be
            // sitting in the pipe even though the child has already been reaped.
            drain_readable(read_fd, &mut buffer)?;
            return Ok(CapturedOutput { bytes: buffer });
        }

        let overdue = start.elapsed() >= runtime;
        let asked_to_stop = terminating.load(Ordering::SeqCst);
        if overdue || asked_to_stop {
            if escalation_stage == 0 {
                let _ = killpg(child, Signal::SIGTERM);
            } else if escalation_stage <= kill_attempts {
                let _ = killpg(child, Signal::SIGKILL);
            } else {
                let _ = killpg(child, Signal::SIGKILL);
                let _ = waitpid(child, None);
                return Ok(CapturedOutput { bytes: buffer });
            }
            escalation_stage += 1;
        }

        std::thread::sleep(POLL_TICK);
    }
}

fn drain_readable(read_fd: RawFd, buffer: &mut Vec<u8>) -> Result<(), ExecError> {
    let mut chunk = [0u8; 4096];
    loop {
        match read(read_fd, &mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                if buffer.try_reserve(n).is_err() {
                    return Err(ExecError::Alloc);
                }
                buffer.extend_from_slice(&chunk[..n]);
            }
            Err(Errno::EAGAIN) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(_) => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let out = execute(
            "echo out; echo err 1>&2",
            Duration::from_secs(5),
            3,
            &flag(),
        )
        .unwrap();
        let text = String::from_utf8_lossy(&out.bytes);
        assert!(text.contains("out"));
        assert!(text.contains("err"));
    }

    #[test]
    fn empty_command_output_is_empty() {
        let out = execute("true", Duration::from_secs(5), 3, &flag()).unwrap();
        assert!(out.bytes.is_empty());
    }

    #[test]
    fn runtime_budget_kills_long_running_child() {
        let start = Instant::now();
        let _ = execute("sleep 30", Duration::from_secs(1), 2, &flag()).unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn termination_flag_triggers_escalation_immediately() {
        let terminating = Arc::new(AtomicBool::new(true));
        let start = Instant::now();
        let _ = execute("sleep 30", Duration::from_secs(30), 2, &terminating).unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
