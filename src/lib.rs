//! minishell: a small interactive shell built directly on fork, exec and pipe.
//!
//! Each input line runs one external program, optionally with its stdout
//! redirected to a file (`cmd args > file`). Pipelines span two lines: a line
//! ending in `|` stages its command, and the next line's command reads its
//! output.
//!
//! # Architecture
//!
//! - **[`parse`]**: Whitespace tokenizer, pipeline and redirection detectors.
//! - **[`exec`]**: Launcher, output redirection, session pipe, fork/wait, signal policy.
//! - **[`session`]**: The prompt loop and the two-line pipeline state machine.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: Session log at `~/.local/share/minishell/session.log`.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Program launching, descriptor wiring, and process control.
pub mod exec;
/// File-based session logging and error reporting.
pub mod logging;
/// Line parsing: tokenizer, detectors, argument vector.
pub mod parse;
/// Interactive loop and pipeline state.
pub mod session;

use std::io;

use session::{LineReader, Session};

/// Run an interactive session on the process's stdin and stdout.
///
/// The caller is expected to have installed the interactive signal policy.
/// Returns an error only when waiting for a child failed.
pub fn run_interactive(config: &config::Config) -> nix::Result<()> {
    let mut input = LineReader::new(io::stdin().lock(), config.settings.max_line_length);
    let mut session = Session::new(config);
    session.run(&mut input, &mut io::stdout())
}
