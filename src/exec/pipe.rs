use std::os::unix::io::RawFd;

use nix::fcntl::{FcntlArg, FdFlag, fcntl};
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{close, dup2, pipe};

use super::stage::close_reporting;
use crate::logging::report;

/// The session's single OS pipe.
///
/// Both ends carry `FD_CLOEXEC`, so a program only ever sees the pipe through
/// the stdin/stdout slot it was duplicated onto. Each end is closed at most
/// once; closed ends are `None`.
#[derive(Debug, Default)]
pub struct SessionPipe {
    read: Option<RawFd>,
    write: Option<RawFd>,
}

impl SessionPipe {
    /// Create the pipe pair.
    pub fn open() -> nix::Result<Self> {
        let mut p = Self::default();
        p.ensure_open()?;
        Ok(p)
    }

    /// A pipe with neither end open.
    pub fn closed() -> Self {
        Self::default()
    }

    /// True when both ends are open.
    pub fn is_open(&self) -> bool {
        self.read.is_some() && self.write.is_some()
    }

    /// Make sure a full pair is available, replacing any half-closed one.
    pub fn ensure_open(&mut self) -> nix::Result<()> {
        if self.is_open() {
            return Ok(());
        }
        self.release();
        let (read, write) = pipe()?;
        for fd in [read, write] {
            if let Err(e) = fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)) {
                let _ = close(read);
                let _ = close(write);
                return Err(e);
            }
        }
        self.read = Some(read);
        self.write = Some(write);
        log::debug!("session pipe opened: r={read} w={write}");
        Ok(())
    }

    /// Right-hand side of a pipeline: drop the write end and read stdin from the pipe.
    pub fn attach_reader(&mut self) {
        self.close_write();
        if let Some(read) = self.read
            && let Err(e) = dup2(read, STDIN_FILENO)
        {
            report("dup2()", e);
        }
    }

    /// Left-hand side of a pipeline: drop the read end and send stdout into the pipe.
    pub fn attach_writer(&mut self) {
        self.close_read();
        if let Some(write) = self.write
            && let Err(e) = dup2(write, STDOUT_FILENO)
        {
            report("dup2()", e);
        }
    }

    pub fn close_read(&mut self) {
        if let Some(fd) = self.read.take() {
            close_reporting(fd);
        }
    }

    pub fn close_write(&mut self) {
        if let Some(fd) = self.write.take() {
            close_reporting(fd);
        }
    }

    /// Close whatever ends are still open.
    pub fn release(&mut self) {
        self.close_read();
        self.close_write();
    }
}

impl Drop for SessionPipe {
    fn drop(&mut self) {
        for fd in [self.read.take(), self.write.take()].into_iter().flatten() {
            let _ = close(fd);
        }
    }
}
