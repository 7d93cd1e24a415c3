//! The interactive loop and the two-line pipeline protocol.
//!
//! A line ending in `|` does not run anything by itself: its command is
//! staged, and the next line becomes the right-hand side. On that next
//! iteration the right-hand side runs in a child reading the session pipe,
//! and the staged command runs in a second child writing into it.
//!
//! ```text
//! $ echo hello |        Idle -> AwaitingRightHandSide (echo hello staged)
//! $ cat                 AwaitingRightHandSide -> Idle (prints "hello")
//! ```

/// Bounded line reading from stdin.
pub mod input;

use std::io::{BufRead, Write};

use nix::unistd::{ForkResult, Pid};

use crate::config::{Config, RedirectionConfig};
use crate::exec::process::{exit_child, fork_retrying, wait_for};
use crate::exec::{Launcher, SessionPipe, SignalPolicy, run_stage};
use crate::logging::report;
use crate::parse::{ArgVector, LineShape, classify, tokenize};

pub use input::{LineReader, ReadOutcome};

/// Whether the previous line left a pipeline half-built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    /// A left-hand command is staged and the pipe is waiting for a reader.
    AwaitingRightHandSide,
}

impl PipelineState {
    /// State after a line has been processed.
    pub fn next(self, line_is_pipeline: bool) -> Self {
        match (self, line_is_pipeline) {
            (PipelineState::Idle, true) => PipelineState::AwaitingRightHandSide,
            _ => PipelineState::Idle,
        }
    }
}

/// What the loop does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

/// Everything the loop carries from one line to the next.
pub struct Session {
    prompt: String,
    exit_keyword: String,
    max_args: usize,
    launcher: Launcher,
    redirection: RedirectionConfig,
    child_signals: SignalPolicy,
    pipe: SessionPipe,
    state: PipelineState,
    staged: Option<ArgVector>,
}

impl Session {
    /// Build a session from configuration and open the session pipe.
    ///
    /// A pipe that cannot be created is reported; the session still starts
    /// and retries when a pipeline is first staged.
    pub fn new(config: &Config) -> Self {
        let pipe = SessionPipe::open().unwrap_or_else(|e| {
            report("pipe", e);
            SessionPipe::closed()
        });
        Self {
            prompt: config.settings.prompt.clone(),
            exit_keyword: config.settings.exit_keyword.clone(),
            max_args: config.settings.max_args,
            launcher: Launcher::from_config(&config.launcher),
            redirection: config.redirection.clone(),
            child_signals: SignalPolicy::foreground_child(),
            pipe,
            state: PipelineState::Idle,
            staged: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn staged(&self) -> Option<&ArgVector> {
        self.staged.as_ref()
    }

    /// Prompt, read and execute lines until the exit keyword or end of input.
    ///
    /// Only a failed wait ends the session with an error.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: &mut LineReader<R>,
        out: &mut W,
    ) -> nix::Result<()> {
        log::info!("session started (pid {})", std::process::id());
        loop {
            let _ = write!(out, "{}", self.prompt);
            let _ = out.flush();

            let line = match input.read_line() {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Discarded => continue,
                ReadOutcome::EndOfInput => {
                    log::info!("end of input, session over");
                    return Ok(());
                }
            };
            if self.step(&line)? == Step::Exit {
                log::info!("exit requested");
                return Ok(());
            }
        }
    }

    /// Process one line.
    pub fn step(&mut self, line: &str) -> nix::Result<Step> {
        if line == self.exit_keyword {
            return Ok(Step::Exit);
        }

        let argv = tokenize(line);
        if argv.is_empty() {
            return Ok(Step::Continue);
        }
        if self.max_args > 0 && argv.len() > self.max_args {
            eprintln!("minishell: too many arguments ({} > {})", argv.len(), self.max_args);
            log::warn!("rejected {}-word line", argv.len());
            return Ok(Step::Continue);
        }

        let shape = classify(&argv);
        let previous = self.state;
        if previous == PipelineState::Idle
            && shape.pipeline
            && let Err(e) = self.pipe.ensure_open()
        {
            report("pipe", e);
            return Ok(Step::Continue);
        }
        log::info!("[{previous:?}] {}", argv.display());

        let mut children: Vec<Pid> = Vec::with_capacity(2);
        match fork_retrying() {
            Ok(ForkResult::Child) => self.run_child(previous, shape, &argv),
            Ok(ForkResult::Parent { child }) => children.push(child),
            Err(e) => {
                report("fork", e);
                self.reset();
                return Ok(Step::Continue);
            }
        }

        match previous {
            PipelineState::AwaitingRightHandSide => {
                if let Some(left) = self.staged.take() {
                    match fork_retrying() {
                        Ok(ForkResult::Child) => self.run_feeder(&left),
                        Ok(ForkResult::Parent { child }) => children.push(child),
                        Err(e) => report("fork", e),
                    }
                }
                self.pipe.release();
            }
            PipelineState::Idle if shape.pipeline => {
                self.staged = Some(argv.without_trailing_pipe());
            }
            PipelineState::Idle => {}
        }

        for pid in children {
            let status = wait_for(pid).inspect_err(|e| report("wait", *e))?;
            log::debug!("child {pid}: {status:?}");
        }

        self.state = previous.next(shape.pipeline);
        if self.state == PipelineState::Idle {
            self.staged = None;
        }
        if self.state != previous {
            log::debug!("{previous:?} -> {:?}", self.state);
        }
        Ok(Step::Continue)
    }

    /// Child side of a line. Never returns.
    fn run_child(&mut self, previous: PipelineState, shape: LineShape, argv: &ArgVector) -> ! {
        if let Err(e) = self.child_signals.install() {
            report("sigaction", e);
        }
        let outcome = match previous {
            PipelineState::AwaitingRightHandSide => {
                self.pipe.attach_reader();
                let outcome = run_stage(&self.launcher, &self.redirection, argv, shape);
                self.pipe.close_read();
                Some(outcome)
            }
            PipelineState::Idle if !shape.pipeline => {
                Some(run_stage(&self.launcher, &self.redirection, argv, shape))
            }
            // Left-hand line: the command waits for the next iteration.
            PipelineState::Idle => None,
        };
        exit_child(outcome.as_ref())
    }

    /// Second child of a completed pipeline: the staged left-hand command
    /// with stdout on the pipe. No redirection check. Never returns.
    fn run_feeder(&mut self, left: &ArgVector) -> ! {
        if let Err(e) = self.child_signals.install() {
            report("sigaction", e);
        }
        self.pipe.attach_writer();
        let outcome = self.launcher.launch(left);
        self.pipe.close_write();
        exit_child(Some(&outcome))
    }

    /// Drop any half-built pipeline.
    fn reset(&mut self) {
        if self.state == PipelineState::AwaitingRightHandSide {
            self.pipe.release();
        }
        self.state = PipelineState::Idle;
        self.staged = None;
    }
}
