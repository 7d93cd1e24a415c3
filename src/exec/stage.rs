use std::os::unix::io::RawFd;

use nix::fcntl::{OFlag, open};
use nix::libc::{STDOUT_FILENO, mode_t};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};

use super::launcher::{ImageLoader, LaunchOutcome, Launcher};
use crate::config::{RedirectMode, RedirectionConfig};
use crate::logging::report;
use crate::parse::{ArgVector, LineShape};

/// Stdout pointed at a redirection target.
#[derive(Debug)]
struct StdoutRedirect {
    file: RawFd,
}

impl StdoutRedirect {
    /// Open `target` and duplicate it onto stdout.
    ///
    /// An open or dup failure is reported and leaves stdout alone.
    fn install(target: &str, config: &RedirectionConfig) -> Option<Self> {
        let file = match open(target, open_flags(config.mode), file_mode(config.permissions)) {
            Ok(fd) => fd,
            Err(e) => {
                report("open", e);
                return None;
            }
        };
        if let Err(e) = dup2(file, STDOUT_FILENO) {
            report("dup2()", e);
            close_reporting(file);
            return None;
        }
        Some(Self { file })
    }

    /// Close both the duplicated stdout and the original descriptor.
    fn close(self) {
        close_reporting(STDOUT_FILENO);
        close_reporting(self.file);
    }
}

pub(crate) fn close_reporting(fd: RawFd) {
    if let Err(e) = close(fd) {
        report("close", e);
    }
}

/// Flags used to open a redirection target.
pub fn open_flags(mode: RedirectMode) -> OFlag {
    let base = OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_CLOEXEC;
    match mode {
        RedirectMode::Append => base | OFlag::O_APPEND,
        RedirectMode::Truncate => base | OFlag::O_TRUNC,
        RedirectMode::InPlace => base,
    }
}

fn file_mode(permissions: u32) -> Mode {
    Mode::from_bits_truncate(permissions as mode_t)
}

/// Run one command in the current (child) process.
///
/// `shape.redirection` names the `FILE` of a trailing `> FILE`: it is
/// applied to stdout and cut from the argument list, then the program is
/// launched. This returns only if the launch failed, in which case any
/// redirection descriptors have been closed again.
pub fn run_stage<L: ImageLoader>(
    launcher: &Launcher<L>,
    redirection: &RedirectionConfig,
    argv: &ArgVector,
    shape: LineShape,
) -> LaunchOutcome {
    let redirect = shape
        .redirection
        .and_then(|index| argv.get(index))
        .and_then(|target| {
            log::debug!("stdout -> {target}");
            StdoutRedirect::install(target, redirection)
        });

    let outcome = launcher.launch(&command_words(argv, shape));

    if !outcome.is_launched()
        && let Some(r) = redirect
    {
        r.close();
    }
    outcome
}

/// The part of `argv` that is handed to the launcher.
pub fn command_words(argv: &ArgVector, shape: LineShape) -> ArgVector {
    let mut words = argv.clone();
    if let Some(index) = shape.redirection {
        words.truncate(index - 1);
    }
    words
}
