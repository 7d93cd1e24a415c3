use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};

use super::launcher::LaunchOutcome;

/// Exit status of a child whose program could not be launched.
pub const EXIT_NOT_FOUND: i32 = 127;

/// `fork(2)`, retried while the kernel reports `EAGAIN`.
pub fn fork_retrying() -> nix::Result<ForkResult> {
    loop {
        // SAFETY: the shell is single-threaded, and the child only sets up
        // descriptors and signals before it execs or exits.
        match unsafe { fork() } {
            Err(Errno::EAGAIN) => continue,
            other => return other,
        }
    }
}

/// Block until `pid` terminates. Interrupted waits are resumed.
pub fn wait_for(pid: Pid) -> nix::Result<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}

/// Exit code for a child after its work is done.
///
/// `None` is the pipeline placeholder, which has nothing to run.
pub fn child_exit_code(outcome: Option<&LaunchOutcome>) -> i32 {
    match outcome {
        None | Some(LaunchOutcome::Launched { .. }) => 0,
        Some(LaunchOutcome::ResolutionFailed { .. }) => EXIT_NOT_FOUND,
    }
}

/// Terminate a forked child.
pub fn exit_child(outcome: Option<&LaunchOutcome>) -> ! {
    std::process::exit(child_exit_code(outcome))
}
