use super::types::{ArgVector, Operator};

/// Shape of one command line as seen by the pipeline controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineShape {
    /// The line ends in `|`: its command is the left-hand side of a pipeline
    /// whose right-hand side arrives on the next line.
    pub pipeline: bool,
    /// Index of the redirection target, if the line ends in `> FILE`.
    pub redirection: Option<usize>,
}

/// Classify a line with both detectors.
pub fn classify(argv: &ArgVector) -> LineShape {
    LineShape {
        pipeline: is_pipeline(argv),
        redirection: redirection_target(argv),
    }
}

/// True iff there are at least two tokens and the last one is `|`.
///
/// `cmd | other` on a single line is not a pipeline; the right-hand command
/// always comes on the following line.
pub fn is_pipeline(argv: &ArgVector) -> bool {
    argv.len() >= 2 && argv.last().is_some_and(|t| Operator::Pipe.matches(t))
}

/// Index of the output file when the line ends in `> FILE`.
///
/// Only the final two tokens are inspected, and at least one command word
/// must precede `>`. The command's own arguments end at `index - 1`.
pub fn redirection_target(argv: &ArgVector) -> Option<usize> {
    let n = argv.len();
    if n < 3 {
        return None;
    }
    argv.get(n - 2)
        .filter(|t| Operator::RedirectOut.matches(t))
        .map(|_| n - 1)
}
