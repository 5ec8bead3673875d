use mio::unix::pipe;
use std::fmt;
use std::io;
use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd};
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

/// Exit status reported for a command that could not be started.
pub const SPAWN_FAILURE_STATUS: i32 = 255;

#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Invalid command line (unbalanced quotes?): {0}")]
    InvalidCommandLine(String),

    #[error("Empty command line")]
    EmptyCommandLine,

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// How a child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Exited(i32),
    Killed(i32),
}

impl From<ExitStatus> for ExitReason {
    fn from(status: ExitStatus) -> ExitReason {
        match (status.code(), status.signal()) {
            (Some(code), _) => ExitReason::Exited(code),
            (None, Some(signal)) => ExitReason::Killed(signal),
            (None, None) => ExitReason::Exited(-1),
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Exited(code) => write!(f, "exited with status {}", code),
            ExitReason::Killed(signal) => write!(f, "killed by signal {}", signal),
        }
    }
}

/// A running child whose stdout and stderr both go into one pipe.
#[derive(Debug)]
pub struct Child {
    process: std::process::Child,
    output: Option<pipe::Receiver>,
    reaped: bool,
}

impl Child {
    pub fn id(&self) -> u32 {
        self.process.id()
    }

    /// Non-blocking read end of the output pipe. Can be taken once.
    pub fn take_output(&mut self) -> Option<pipe::Receiver> {
        self.output.take()
    }

    /// Checks, without blocking, whether the child has terminated.
    /// Answers `Some` at most once.
    pub fn reap(&mut self) -> io::Result<Option<ExitReason>> {
        if self.reaped {
            return Ok(None);
        }
        match self.process.try_wait()? {
            Some(status) => {
                self.reaped = true;
                Ok(Some(status.into()))
            }
            None => Ok(None),
        }
    }
}

/// Starts `command_line` with stdin detached and its output redirected into
/// a fresh pipe.
///
/// On Linux the child asks to be sent `SIGTERM` when this process dies.
/// That request is best-effort: the kernel drops it for set-uid binaries and
/// binaries with file capabilities, which ping often is.
pub fn spawn(command_line: &str) -> Result<Child, SpawnError> {
    let args = shlex::split(command_line)
        .ok_or_else(|| SpawnError::InvalidCommandLine(command_line.to_string()))?;
    let (program, args) = args.split_first().ok_or(SpawnError::EmptyCommandLine)?;

    let (sender, receiver) = pipe::new()?;
    // The write end is shared with the child, which expects blocking writes.
    sender.set_nonblocking(false)?;
    // SAFETY: the descriptor was just released by `sender` and is owned by
    // nothing else.
    let stdout = unsafe { OwnedFd::from_raw_fd(sender.into_raw_fd()) };
    let stderr = stdout.try_clone()?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));
    #[cfg(target_os = "linux")]
    set_parent_death_signal(&mut command);

    let process = command.spawn()?;
    // Closes our copies of the write end, so that end of stream is seen once
    // the child is gone.
    drop(command);
    debug!(pid = process.id(), command = command_line, "spawned child");

    Ok(Child {
        process,
        output: Some(receiver),
        reaped: false,
    })
}

#[cfg(target_os = "linux")]
fn set_parent_death_signal(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    let parent = std::process::id() as libc::pid_t;
    // SAFETY: only async-signal-safe calls run between fork and exec.
    unsafe {
        command.pre_exec(move || {
            if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM as libc::c_ulong) != 0 {
                return Err(io::Error::last_os_error());
            }
            // The parent may have died before the request was in place.
            if libc::getppid() != parent {
                return Err(io::Error::from_raw_os_error(libc::ESRCH));
            }
            Ok(())
        });
    }
}

/// Sends `SIGTERM` to a child which has not been reaped yet. A child that is
/// already gone is not an error.
pub fn terminate(pid: u32) -> io::Result<()> {
    // SAFETY: plain syscall; the pid belongs to our own unreaped child, so it
    // cannot have been recycled.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_errors() {
        assert!(matches!(
            spawn("ping 'unterminated"),
            Err(SpawnError::InvalidCommandLine(_))
        ));
        assert!(matches!(spawn("   "), Err(SpawnError::EmptyCommandLine)));
        assert!(matches!(
            spawn("/nonexistent/definitely-not-a-program"),
            Err(SpawnError::Io(_))
        ));
    }

    #[test]
    fn exit_reasons() {
        assert_eq!(
            ExitReason::from(ExitStatus::from_raw(3 << 8)),
            ExitReason::Exited(3)
        );
        assert_eq!(
            ExitReason::from(ExitStatus::from_raw(libc::SIGKILL)),
            ExitReason::Killed(9)
        );
        assert_eq!(ExitReason::Exited(255).to_string(), "exited with status 255");
        assert_eq!(ExitReason::Killed(15).to_string(), "killed by signal 15");
    }

    #[test]
    fn reap_answers_once() {
        let mut child = spawn("true").unwrap();
        let reason = loop {
            if let Some(reason) = child.reap().unwrap() {
                break reason;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_eq!(reason, ExitReason::Exited(0));
        assert_eq!(child.reap().unwrap(), None);
    }
}
