//! Program resolution and process-image replacement.
//!
//! A program name is looked up in a fixed, ordered list of directories (by
//! default `/bin` then `/usr/bin`), not through `$PATH`. The first candidate
//! that `execv` accepts replaces the calling process.

use std::ffi::{CStr, CString};
use std::path::PathBuf;

use nix::errno::Errno;
use nix::unistd::execv;

use crate::config::LauncherConfig;
use crate::logging::report;
use crate::parse::ArgVector;

/// The primitive that swaps the process image.
///
/// On success the real implementation never returns; test doubles return
/// `Ok(())` to stand in for a successful exec.
pub trait ImageLoader {
    fn exec(&self, path: &CStr, argv: &[CString]) -> Result<(), Errno>;
}

/// `execv(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Execv;

impl ImageLoader for Execv {
    fn exec(&self, path: &CStr, argv: &[CString]) -> Result<(), Errno> {
        match execv(path, argv) {
            Ok(never) => match never {},
            Err(e) => Err(e),
        }
    }
}

/// One failed candidate path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub path: PathBuf,
    pub error: Errno,
}

/// Result of [`Launcher::launch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The image at `path` was loaded. Only observable with a test loader.
    Launched { path: PathBuf },
    /// No candidate could be executed.
    ResolutionFailed { attempts: Vec<Attempt> },
}

impl LaunchOutcome {
    pub fn is_launched(&self) -> bool {
        matches!(self, LaunchOutcome::Launched { .. })
    }
}

/// Resolves a program name against the search directories and execs it.
#[derive(Debug, Clone)]
pub struct Launcher<L = Execv> {
    search_dirs: Vec<String>,
    loader: L,
}

impl Launcher<Execv> {
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::with_loader(config.search_dirs.clone(), Execv)
    }
}

impl<L: ImageLoader> Launcher<L> {
    pub fn with_loader(search_dirs: Vec<String>, loader: L) -> Self {
        Self {
            search_dirs,
            loader,
        }
    }

    /// Candidate paths for `program`, in the order they are tried.
    ///
    /// The name is appended verbatim, so `./tool` becomes `/bin/./tool`.
    pub fn candidates(&self, program: &str) -> Vec<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| PathBuf::from(format!("{}/{program}", dir.trim_end_matches('/'))))
            .collect()
    }

    /// Exec `argv[0]` from the first search directory that works.
    ///
    /// `argv` is passed unchanged as the new program's argument list. Returns
    /// only when every candidate failed; the failure has already been
    /// reported on stderr by then. Whether to exit is up to the caller.
    pub fn launch(&self, argv: &ArgVector) -> LaunchOutcome {
        let Some(program) = argv.program() else {
            return LaunchOutcome::ResolutionFailed { attempts: vec![] };
        };
        let args = match argv.to_exec_args() {
            Ok(args) => args,
            Err(e) => {
                report("execv", e);
                return LaunchOutcome::ResolutionFailed { attempts: vec![] };
            }
        };

        let mut attempts = Vec::new();
        for path in self.candidates(program) {
            let c_path = match CString::new(path.as_os_str().as_encoded_bytes()) {
                Ok(p) => p,
                Err(_) => {
                    attempts.push(Attempt {
                        path,
                        error: Errno::EINVAL,
                    });
                    continue;
                }
            };
            match self.loader.exec(&c_path, &args) {
                Ok(()) => return LaunchOutcome::Launched { path },
                Err(error) => {
                    log::debug!("exec {} failed: {error}", path.display());
                    attempts.push(Attempt { path, error });
                }
            }
        }

        let last = attempts.last().map_or(Errno::ENOENT, |a| a.error);
        report("execv", last);
        log::info!("{program}: not found in {:?}", self.search_dirs);
        LaunchOutcome::ResolutionFailed { attempts }
    }
}
