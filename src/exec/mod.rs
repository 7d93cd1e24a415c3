//! Process side of the shell: launching programs, rewiring descriptors,
//! forking and reaping children, and signal dispositions.

/// Program lookup through the search directories and `execv`.
pub mod launcher;
/// The long-lived pipe shared by the two halves of a pipeline.
pub mod pipe;
/// Fork/wait helpers.
pub mod process;
/// Interrupt and termination policy for the loop and its children.
pub mod signals;
/// Output redirection followed by launch, run inside a child.
pub mod stage;

pub use launcher::{Attempt, Execv, ImageLoader, LaunchOutcome, Launcher};
pub use pipe::SessionPipe;
pub use signals::{Disposition, SignalPolicy};
pub use stage::run_stage;
