//! Signal dispositions for the interactive loop and its foreground children.
//!
//! The shell absorbs SIGINT so Ctrl-C never ends the session. A freshly
//! forked child turns SIGINT into SIGTERM against itself and lets SIGTERM
//! kill it. Caught handlers fall back to the default action on `exec`, so
//! the running program dies on Ctrl-C while the prompt loop carries on.

use nix::libc::{c_int, c_void, siginfo_t};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, kill, raise, sigaction};
use nix::unistd::getpid;

/// What happens when a given signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Leave the inherited disposition untouched.
    Inherit,
    /// The default action.
    Default,
    /// Catch the signal and do nothing.
    Absorb,
    /// Raise SIGTERM against this process.
    RaiseTerminate,
    /// Send SIGTERM to this process with `kill(2)`; the handler resets to
    /// the default on entry, so the re-sent signal terminates.
    KillSelf,
}

/// Dispositions for the three signals the shell cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalPolicy {
    pub interrupt: Disposition,
    pub terminate: Disposition,
    pub broken_pipe: Disposition,
}

impl SignalPolicy {
    /// The prompt loop.
    pub const fn interactive() -> Self {
        Self {
            interrupt: Disposition::Absorb,
            terminate: Disposition::Inherit,
            broken_pipe: Disposition::Inherit,
        }
    }

    /// A child about to run a command. SIGPIPE goes back to the default
    /// since the Rust runtime ignores it and ignored signals survive `exec`.
    pub const fn foreground_child() -> Self {
        Self {
            interrupt: Disposition::RaiseTerminate,
            terminate: Disposition::KillSelf,
            broken_pipe: Disposition::Default,
        }
    }

    /// Install the policy in the calling process.
    pub fn install(&self) -> nix::Result<()> {
        install_one(Signal::SIGTERM, self.terminate)?;
        install_one(Signal::SIGINT, self.interrupt)?;
        install_one(Signal::SIGPIPE, self.broken_pipe)
    }
}

extern "C" fn absorb(_: c_int, _: *mut siginfo_t, _: *mut c_void) {}

extern "C" fn raise_terminate(_: c_int) {
    let _ = raise(Signal::SIGTERM);
}

extern "C" fn kill_self(_: c_int) {
    let _ = kill(getpid(), Signal::SIGTERM);
}

/// The `sigaction` a disposition maps to; `None` for [`Disposition::Inherit`].
pub fn action_for(disposition: Disposition) -> Option<SigAction> {
    let (handler, flags) = match disposition {
        Disposition::Inherit => return None,
        Disposition::Default => (SigHandler::SigDfl, SaFlags::empty()),
        Disposition::Absorb => (SigHandler::SigAction(absorb), SaFlags::SA_NODEFER),
        Disposition::RaiseTerminate => (SigHandler::Handler(raise_terminate), SaFlags::empty()),
        Disposition::KillSelf => (
            SigHandler::Handler(kill_self),
            SaFlags::SA_RESETHAND | SaFlags::SA_NODEFER,
        ),
    };
    Some(SigAction::new(handler, flags, SigSet::empty()))
}

fn install_one(signal: Signal, disposition: Disposition) -> nix::Result<()> {
    let Some(action) = action_for(disposition) else {
        return Ok(());
    };
    // SAFETY: every handler above only calls async-signal-safe functions
    // (raise, kill, getpid) or nothing at all.
    unsafe { sigaction(signal, &action) }.map(|_| ())
}
